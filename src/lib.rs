pub mod catalog;
pub mod cli;
pub mod colors;
pub mod decoder;
pub mod errors;
pub mod event;
pub mod facility;
pub mod registers;
pub mod session;
pub mod summary;
pub mod threads;
pub mod writer;
