pub mod completion;
pub mod emotion;
pub mod generator;
pub mod http;
pub mod parser;
pub mod prompt;
pub mod validator;
pub mod wellness;
