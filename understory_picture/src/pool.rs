// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation-checked slot arena for in-flight draw commands.
//!
//! A recorder appends commands into the pool while recording and drains them
//! into a picture when recording ends. Slots are recycled through a free list,
//! so steady-state recording reuses storage instead of growing it.
//!
//! Every slot carries a generation that is bumped on release. A
//! [`CommandHandle`] remembers the generation it was issued with, so a handle
//! whose slot was released (and possibly reused) resolves to `None` instead of
//! to an unrelated command.

use crate::command::DrawCommand;

/// Handle to a command held by a [`CommandPool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommandHandle {
    index: u32,
    generation: u32,
}

impl CommandHandle {
    /// Slot index of this handle.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    command: Option<DrawCommand>,
}

/// Typed arena with a free list for [`DrawCommand`]s.
#[derive(Debug, Default)]
pub struct CommandPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl CommandPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `command` and return a handle to it.
    pub fn acquire(&mut self, command: DrawCommand) -> CommandHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.command.is_none(), "free list slot still occupied");
            slot.command = Some(command);
            return CommandHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            command: Some(command),
        });
        CommandHandle {
            index,
            generation: 0,
        }
    }

    /// Resolve a handle, or `None` if it was released.
    pub fn get(&self, handle: CommandHandle) -> Option<&DrawCommand> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.command.as_ref()
    }

    /// Release a handle and return its command.
    ///
    /// The handle (and any copy of it) is dead afterwards, even if the slot is
    /// reused by a later [`acquire`](Self::acquire).
    pub fn release(&mut self, handle: CommandHandle) -> Option<DrawCommand> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let command = slot.command.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(command)
    }

    /// Number of commands currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if the pool holds no commands.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots allocated, live or free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
