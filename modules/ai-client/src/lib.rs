pub mod error;
pub mod openai;
pub mod util;

pub use error::{AiError, Result};
pub use openai::{OpenAi, Sampling};
pub use util::truncate_to_char_boundary;
