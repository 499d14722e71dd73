use std::fmt;

use super::function::Function;

/// A complete IR module: an ordered collection of functions.
///
/// Functions are emitted in insertion order, which fixes the layout of the
/// generated assembly unit. The source file name drives the name of the
/// emitted `.asm` file.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub source_file_name: String,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(source_file_name: impl Into<String>) -> Self {
        Module {
            source_file_name: source_file_name.into(),
            functions: Vec::new(),
        }
    }

    pub fn add_function(&mut self, func: Function) {
        self.functions.push(func);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

// --- Display Implementations ---

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}
