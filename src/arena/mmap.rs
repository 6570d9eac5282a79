use std::fs::File;
use std::io;

use memmap2::{MmapMut, MmapOptions};

use super::{Allocator, PAGE_SIZE};
use crate::error::ArenaFull;

/// A page arena backed by an `mmap`'d file.
///
/// Growing the arena extends the file with [`File::set_len`] and remaps it;
/// like [`HeapArena`](super::HeapArena), the new mapping may land at a
/// different address, so [`base`](Allocator::base) must be re-read by the
/// caller after every [`grow`](Allocator::grow).
pub struct MmapArena {
    file: File,
    map: MmapMut,
    page_size: usize,
    next_offset: usize,
    free_list: Vec<usize>,
}

impl MmapArena {
    /// Open (or create, via the caller's `File`) a file-backed arena with
    /// room for `initial_pages` pages.
    pub fn new(file: File, initial_pages: usize, page_size: usize) -> io::Result<Self> {
        let len = (initial_pages.max(1) * page_size) as u64;
        file.set_len(len)?;
        let map = unsafe { MmapOptions::new().len(len as usize).map_mut(&file)? };
        Ok(Self {
            file,
            map,
            page_size,
            next_offset: 0,
            free_list: Vec::new(),
        })
    }

    /// Open a file-backed arena with the default page size.
    pub fn with_capacity(file: File, initial_pages: usize) -> io::Result<Self> {
        Self::new(file, initial_pages, PAGE_SIZE)
    }
}

impl Allocator for MmapArena {
    fn base(&self) -> *mut u8 {
        self.map.as_ptr() as *mut u8
    }

    fn allocate_page(&mut self) -> Result<usize, ArenaFull> {
        if let Some(offset) = self.free_list.pop() {
            return Ok(offset);
        }
        if self.next_offset + self.page_size > self.map.len() {
            return Err(ArenaFull);
        }
        let offset = self.next_offset;
        self.next_offset += self.page_size;
        Ok(offset)
    }

    fn free_page(&mut self, offset: usize) {
        self.free_list.push(offset);
    }

    fn grow(&mut self) -> Result<(), ArenaFull> {
        let new_len = (self.map.len().max(self.page_size) * 2) as u64;
        self.file.set_len(new_len).map_err(|_| ArenaFull)?;
        let map = unsafe {
            MmapOptions::new()
                .len(new_len as usize)
                .map_mut(&self.file)
                .map_err(|_| ArenaFull)?
        };
        self.map = map;
        Ok(())
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}
