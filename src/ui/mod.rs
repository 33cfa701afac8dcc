pub mod grid;
pub mod pages;
pub mod panels;
pub mod plot;
