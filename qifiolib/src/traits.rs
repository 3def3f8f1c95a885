//! Унифицированные трэйты чтения/записи на основе std::io::{BufRead, Write}.
//!
//! В отличие от форматов без параметров, CSV читается по шаблону, поэтому
//! методы принимают `&self`: реализация хранит свою конфигурацию.

use crate::error::Result;
use std::io::{BufRead, Write};

pub trait ReadFormat {
    type Output;

    fn read<R: BufRead>(&self, r: R) -> Result<Self::Output>;
}

pub trait WriteFormat {
    type Input: ?Sized;

    fn write<W: Write>(&self, w: W, value: &Self::Input) -> Result<()>;
}

pub trait Format: ReadFormat + WriteFormat {}
impl<T: ReadFormat + WriteFormat> Format for T {}
