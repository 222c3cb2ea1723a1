use std::fmt;

use crate::fault::Fault;
use crate::word::{is_valid, Word, MEMORY_SIZE};

pub mod image;

/// Emulates memory for use with the CPU
///
/// Cells start out unwritten; reading one is a fault.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Memory {
    /// The actual data of the memory
    cells: Box<[Option<Word>]>,
}

impl Default for Memory {
    /// Initializes the memory
    fn default() -> Self {
        Memory {
            cells: vec![None; MEMORY_SIZE].into_boxed_slice(),
        }
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("written", &self.written().count())
            .finish()
    }
}

impl Memory {
    /// Creates a memory holding `program` at address zero
    pub fn from_program(program: &[Word]) -> Result<Self, Fault> {
        let mut memory = Self::default();
        memory.load(program)?;
        Ok(memory)
    }

    /// Copies `program` to address zero. Nothing is written unless every word
    /// is valid.
    pub fn load(&mut self, program: &[Word]) -> Result<(), Fault> {
        if program.len() > self.cells.len() {
            return Err(Fault::ProgramTooLarge { len: program.len() });
        }
        if let Some(&value) = program.iter().find(|&&word| !is_valid(word)) {
            return Err(Fault::InvalidWord { value });
        }

        for (cell, &word) in self.cells.iter_mut().zip(program) {
            *cell = Some(word);
        }

        Ok(())
    }

    /// Reads a word from the memory
    pub fn read(&self, address: usize) -> Result<Word, Fault> {
        match self.cells.get(address) {
            Some(Some(word)) => Ok(*word),
            Some(None) => Err(Fault::Unwritten { address }),
            None => Err(Fault::OutOfBounds { address }),
        }
    }

    /// Writes a word to the memory
    pub fn write(&mut self, address: usize, word: Word) -> Result<(), Fault> {
        if !is_valid(word) {
            return Err(Fault::InvalidWord { value: word });
        }
        let cell = self
            .cells
            .get_mut(address)
            .ok_or(Fault::OutOfBounds { address })?;
        *cell = Some(word);

        Ok(())
    }

    /// Writes an array of words to the memory
    pub fn write_array(&mut self, address: usize, words: &[Word]) -> Result<(), Fault> {
        let end = address + words.len();
        if end > self.cells.len() {
            return Err(Fault::OutOfBounds { address: end - 1 });
        }
        if let Some(&value) = words.iter().find(|&&word| !is_valid(word)) {
            return Err(Fault::InvalidWord { value });
        }

        for (cell, &word) in self.cells[address..end].iter_mut().zip(words) {
            *cell = Some(word);
        }

        Ok(())
    }

    pub fn is_written(&self, address: usize) -> bool {
        matches!(self.cells.get(address), Some(Some(_)))
    }

    /// Returns `(address, word)` for every written cell in address order
    pub fn written(&self) -> impl Iterator<Item = (usize, Word)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(address, cell)| cell.map(|word| (address, word)))
    }

    /// Returns the written words without their addresses.
    ///
    /// Gaps collapse, so the result cannot be loaded back in place.
    pub fn compact(&self) -> Vec<Word> {
        self.written().map(|(_, word)| word).collect()
    }

    /// Returns the cells `from..=to`, clamped to the end of memory
    pub fn range(&self, from: usize, to: usize) -> Vec<(usize, Option<Word>)> {
        let to = to.min(self.cells.len() - 1);
        (from..=to).map(|address| (address, self.cells[address])).collect()
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $word:expr ),+ $(,)? ) => {
        $mem.write_array($pos, &[
            $(
                $word as $crate::word::Word,
            )+
        ])
    };
}

#[cfg(test)]
mod tests {
    use crate::processor::Opcode;
    use crate::word::reg;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_read_unwritten() -> Result<()> {
        let mem = Memory::default();
        assert_eq!(mem.read(2), Err(Fault::Unwritten { address: 2 }));
        assert_eq!(
            mem.read(MEMORY_SIZE),
            Err(Fault::OutOfBounds {
                address: MEMORY_SIZE
            })
        );

        Ok(())
    }

    #[test]
    fn test_write() -> Result<()> {
        let mut mem = Memory::default();
        mem.write(0x44, 12)?;
        assert_eq!(mem.read(0x44)?, 12);
        assert!(mem.is_written(0x44));
        assert!(!mem.is_written(0x45));

        mem.write(0x44, 32775)?;
        assert_eq!(mem.read(0x44)?, 32775);

        assert_eq!(
            mem.write(0x44, 32776),
            Err(Fault::InvalidWord { value: 32776 })
        );
        assert_eq!(
            mem.write(MEMORY_SIZE, 1),
            Err(Fault::OutOfBounds {
                address: MEMORY_SIZE
            })
        );

        Ok(())
    }

    #[test]
    fn test_load() -> Result<()> {
        let mem = Memory::from_program(&[9, 32768, 1, 2])?;
        assert_eq!(mem.read(0)?, 9);
        assert_eq!(mem.read(1)?, 32768);
        assert_eq!(mem.read(3)?, 2);
        assert!(!mem.is_written(4));

        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_words() -> Result<()> {
        let mut mem = Memory::default();
        assert_eq!(
            mem.load(&[1, 2, 40000]),
            Err(Fault::InvalidWord { value: 40000 })
        );
        // nothing was written
        assert!(!mem.is_written(0));

        let too_large = vec![0; MEMORY_SIZE + 1];
        assert_eq!(
            mem.load(&too_large),
            Err(Fault::ProgramTooLarge {
                len: MEMORY_SIZE + 1
            })
        );

        let full = vec![21; MEMORY_SIZE];
        mem.load(&full)?;
        assert_eq!(mem.read(MEMORY_SIZE - 1)?, 21);

        Ok(())
    }

    #[test]
    fn test_compact_drops_gaps() -> Result<()> {
        let mut mem = Memory::default();
        mem.write(3, 30)?;
        mem.write(1, 10)?;
        mem.write(200, 2000)?;

        assert_eq!(
            mem.written().collect::<Vec<_>>(),
            vec![(1, 10), (3, 30), (200, 2000)]
        );
        assert_eq!(mem.compact(), vec![10, 30, 2000]);

        Ok(())
    }

    #[test]
    fn test_range() -> Result<()> {
        let mem = Memory::from_program(&[1, 2, 3])?;
        assert_eq!(
            mem.range(1, 3),
            vec![(1, Some(2)), (2, Some(3)), (3, None)]
        );
        assert_eq!(mem.range(MEMORY_SIZE - 1, MEMORY_SIZE + 10).len(), 1);

        Ok(())
    }

    #[test]
    fn test_write_instructions() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_array(
            0x100,
            &[
                Opcode::NOOP as Word,
                Opcode::SET as Word,
                32768,
                42,
                Opcode::OUT as Word,
                '#' as Word,
                Opcode::HALT as Word,
            ],
        )?;

        let mut mem2 = Memory::default();
        use crate::processor::Opcode::*;
        write_instructions!(mem2 : 0x100 => NOOP, SET, reg(0), 42, OUT, '#', HALT)?;

        assert_eq!(mem, mem2);

        Ok(())
    }
}
