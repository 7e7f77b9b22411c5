//! Reading of vertical (one token per line) corpus files.
//!
//! A vertical file carries one token per line with tab-separated positional
//! attributes; structural markup (`<doc id="...">`, `</s>`) occupies lines of
//! its own. The reader turns the file into a stream of [`VerticalLine`]s and
//! [`parse_vertical`] drives a [`TokenProcessor`] over it.

pub mod reader;
pub mod token;

pub use reader::{ParseStats, TokenProcessor, VerticalLine, VerticalReader, parse_vertical, parse_vertical_reader};
pub use token::{Token, TokenLayout, TokenRow};
