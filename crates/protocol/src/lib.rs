#![forbid(unsafe_code)]

mod command;
mod line;
mod parse;
mod reply;

pub use command::Command;
pub use line::decode_line;
pub use parse::Parse;
pub use reply::Reply;
