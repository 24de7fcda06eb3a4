pub mod converter;
pub mod docx;
pub mod handler;
pub mod rtf;
pub mod text;

#[cfg(test)]
mod testing;

pub use converter::{
    ConvertError, ConvertInput, ConvertResult, Conversion, Converter, ConverterStatus,
    PandocConverter,
};
pub use handler::{DocumentHandler, HandlerContext, handler_for, process_document};
