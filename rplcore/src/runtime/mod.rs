//! The runtime: heap, stack, directories, and the last-error slot.
//!
//! Stack levels and directory entries hold [`Handle`]s into the heap. Objects
//! are encoded when they enter the runtime and decoded when they are read back,
//! so a value taken from the stack never borrows heap memory across a call
//! that may collect.

pub mod directory;
pub mod heap;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    encoding::{self, codec},
    error::{RplError, RplResult},
    object::{Object, Symbol},
    settings::Settings,
};
use directory::{Directory, Entry};
pub use heap::{Handle, Heap, HeapStats};

#[derive(Debug)]
pub struct Runtime {
    heap: Heap,
    stack: Vec<Handle>,
    /// Temporary roots, see [`Runtime::protect`].
    scribble: Vec<Handle>,
    home: Directory,
    path: Vec<Symbol>,
    settings: Settings,
    last_error: Option<RplError>,
    interrupt: Arc<AtomicBool>,
    pub(crate) nesting: u32,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Runtime {
    pub fn new(settings: Settings) -> Self {
        Self {
            heap: Heap::new(settings.heap_size, settings.heap_limit),
            stack: Vec::new(),
            scribble: Vec::new(),
            home: Directory::new(),
            path: Vec::new(),
            settings,
            last_error: None,
            interrupt: Arc::new(AtomicBool::new(false)),
            nesting: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    // ---------------- Heap ----------------

    /// Encode `object` and place it on the heap, collecting or growing the heap if needed.
    pub fn make(&mut self, object: &Object) -> RplResult<Handle> {
        let encoded = codec::encode(object);
        if encoding::object_size(&encoded)? != encoded.len() {
            return Err(RplError::InvalidObject("encoded size does not match payload"));
        }
        if let Some(handle) = self.heap.allocate(&encoded) {
            return Ok(handle);
        }
        self.gc();
        if let Some(handle) = self.heap.allocate(&encoded) {
            return Ok(handle);
        }
        if self.heap.grow(encoded.len()) {
            if let Some(handle) = self.heap.allocate(&encoded) {
                return Ok(handle);
            }
        }
        Err(RplError::OutOfMemory)
    }

    /// Decode the object behind `handle`.
    pub fn object(&self, handle: Handle) -> RplResult<Object> {
        let (object, _) = codec::decode(self.heap.get(handle)?)?;
        Ok(object)
    }

    /// Encoded bytes of the object behind `handle`.
    pub fn bytes(&self, handle: Handle) -> RplResult<&[u8]> {
        self.heap.get(handle)
    }

    /// Collect everything not reachable from the stack, directories or scribble area.
    pub fn gc(&mut self) -> usize {
        let mut roots = self.stack.clone();
        roots.extend_from_slice(&self.scribble);
        self.home.handles(&mut roots);
        self.heap.collect(roots)
    }

    pub fn stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Marker for [`Runtime::release`].
    pub fn scribble(&self) -> usize {
        self.scribble.len()
    }

    /// Keep `handle` alive across collections until released.
    pub fn protect(&mut self, handle: Handle) {
        self.scribble.push(handle);
    }

    /// Drop temporary roots registered after `marker`.
    pub fn release(&mut self, marker: usize) {
        self.scribble.truncate(marker);
    }

    // ---------------- Stack ----------------

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self, object: &Object) -> RplResult<()> {
        let handle = self.make(object)?;
        self.stack.push(handle);
        Ok(())
    }

    pub fn push_handle(&mut self, handle: Handle) -> RplResult<()> {
        if !self.heap.is_valid(handle) {
            return Err(RplError::InvalidHandle);
        }
        self.stack.push(handle);
        Ok(())
    }

    fn need(&self, n: usize) -> RplResult<()> {
        if self.stack.len() < n {
            Err(RplError::TooFewArguments)
        } else {
            Ok(())
        }
    }

    /// Handle at stack level `n`, where level 1 is the top.
    pub fn level_handle(&self, n: usize) -> RplResult<Handle> {
        if n == 0 {
            return Err(RplError::ValueError);
        }
        self.need(n)?;
        Ok(self.stack[self.stack.len() - n])
    }

    pub fn level(&self, n: usize) -> RplResult<Object> {
        self.object(self.level_handle(n)?)
    }

    pub fn top(&self) -> RplResult<Object> {
        self.level(1)
    }

    pub fn pop(&mut self) -> RplResult<Object> {
        let handle = self.level_handle(1)?;
        let object = self.object(handle)?;
        self.stack.pop();
        Ok(object)
    }

    /// The top `n` levels, deepest first, without removing them.
    pub fn args(&self, n: usize) -> RplResult<Vec<Object>> {
        self.need(n)?;
        self.stack[self.stack.len() - n..]
            .iter()
            .map(|handle| self.object(*handle))
            .collect()
    }

    pub fn drop_n(&mut self, n: usize) -> RplResult<()> {
        self.need(n)?;
        self.stack.truncate(self.stack.len() - n);
        Ok(())
    }

    /// Copy level `n` to the top. The copy shares the heap object.
    pub fn pick(&mut self, n: usize) -> RplResult<()> {
        let handle = self.level_handle(n)?;
        self.stack.push(handle);
        Ok(())
    }

    pub fn dup(&mut self) -> RplResult<()> {
        self.pick(1)
    }

    pub fn dup2(&mut self) -> RplResult<()> {
        self.need(2)?;
        self.pick(2)?;
        self.pick(2)
    }

    pub fn over(&mut self) -> RplResult<()> {
        self.pick(2)
    }

    pub fn swap(&mut self) -> RplResult<()> {
        self.need(2)?;
        let len = self.stack.len();
        self.stack.swap(len - 1, len - 2);
        Ok(())
    }

    /// Move level 3 to the top.
    pub fn rot(&mut self) -> RplResult<()> {
        self.need(3)?;
        let handle = self.stack.remove(self.stack.len() - 3);
        self.stack.push(handle);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub(crate) fn snapshot(&self) -> Vec<Handle> {
        self.stack.clone()
    }

    pub(crate) fn restore(&mut self, stack: Vec<Handle>) {
        self.stack = stack;
    }

    // ---------------- Directories ----------------

    fn current(&self) -> &Directory {
        let cs = self.settings.case_sensitive;
        let mut dir = &self.home;
        for name in &self.path {
            match dir.get(name, cs) {
                Some(Entry::Directory(sub)) => dir = sub,
                _ => break,
            }
        }
        dir
    }

    fn current_mut(&mut self) -> RplResult<&mut Directory> {
        let cs = self.settings.case_sensitive;
        let mut dir = &mut self.home;
        for name in &self.path {
            dir = match dir.get_mut(name, cs) {
                Some(Entry::Directory(sub)) => sub,
                _ => return Err(RplError::UndefinedName(name.name().to_string())),
            };
        }
        Ok(dir)
    }

    /// Directories from home down to the current one.
    fn chain(&self) -> Vec<&Directory> {
        let cs = self.settings.case_sensitive;
        let mut chain = vec![&self.home];
        let mut dir = &self.home;
        for name in &self.path {
            match dir.get(name, cs) {
                Some(Entry::Directory(sub)) => {
                    chain.push(sub);
                    dir = sub;
                }
                _ => break,
            }
        }
        chain
    }

    pub fn store(&mut self, name: &Symbol, value: &Object) -> RplResult<()> {
        let cs = self.settings.case_sensitive;
        if let Some(Entry::Directory(_)) = self.current().get(name, cs) {
            return Err(RplError::TypeError);
        }
        let handle = self.make(value)?;
        self.current_mut()?
            .insert(name.clone(), Entry::Value(handle), cs);
        Ok(())
    }

    /// Value of `name` in the current directory or the closest parent defining it.
    pub fn recall(&self, name: &Symbol) -> Option<Object> {
        let cs = self.settings.case_sensitive;
        self.chain()
            .into_iter()
            .rev()
            .find_map(|dir| match dir.get(name, cs) {
                Some(Entry::Value(handle)) => Some(*handle),
                _ => None,
            })
            .and_then(|handle| self.object(handle).ok())
    }

    pub fn purge(&mut self, name: &Symbol) -> RplResult<()> {
        let cs = self.settings.case_sensitive;
        match self.current_mut()?.remove(name, cs) {
            Some(_) => Ok(()),
            None => Err(RplError::UndefinedName(name.name().to_string())),
        }
    }

    pub fn crdir(&mut self, name: &Symbol) -> RplResult<()> {
        let cs = self.settings.case_sensitive;
        let dir = self.current_mut()?;
        if dir.get(name, cs).is_some() {
            return Err(RplError::ValueError);
        }
        dir.insert(name.clone(), Entry::Directory(Directory::new()), cs);
        Ok(())
    }

    /// Make the subdirectory `name` of the current directory current.
    pub fn enter(&mut self, name: &Symbol) -> bool {
        let cs = self.settings.case_sensitive;
        if let Some(Entry::Directory(_)) = self.current().get(name, cs) {
            self.path.push(name.clone());
            true
        } else {
            false
        }
    }

    pub fn updir(&mut self) {
        self.path.pop();
    }

    pub fn home(&mut self) {
        self.path.clear();
    }

    /// Names of the directories leading from home to the current directory.
    pub fn path(&self) -> &[Symbol] {
        &self.path
    }

    /// Names defined in the current directory.
    pub fn variables(&self) -> Vec<Symbol> {
        self.current().names().cloned().collect()
    }

    // ---------------- Errors and interrupts ----------------

    /// The error recorded by the last failed top-level operation.
    pub fn error(&self) -> Option<&RplError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub(crate) fn set_error(&mut self, error: RplError) {
        self.last_error = Some(error);
    }

    /// Flag another thread may set to stop long-running operations.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    /// Consume a pending interrupt request.
    pub fn interrupted(&self) -> bool {
        self.interrupt.swap(false, Ordering::Relaxed)
    }
}
