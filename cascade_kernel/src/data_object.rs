//! Data objects: single-writer / multi-reader value slots.
//!
//! Each data object is a seqlock over a `Copy` value. The version counter is
//! even while the value is stable and odd while a write is in progress:
//!
//! ```text
//! writer: v(even) ─CAS→ v+1 (odd) ─ write value ─ store v+2 (even)
//! reader: load v1 ─ copy value ─ load v2 ─ accept iff v1 == v2 && even
//! ```
//!
//! Writers never wait: a second writer racing the first loses the CAS and
//! `set` returns `false`. Readers retry a bounded number of times in
//! [`DataObject::try_get`]; [`DataObject::get`] spins until it observes a
//! stable version.

use cascade_common::config::ChannelPrefixes;
use cascade_common::consts::MAX_READ_RETRIES;
use cascade_common::role::Channels;
use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering, fence};

// ─── Type Family ────────────────────────────────────────────────────

/// Value types of the five data objects of one kernel.
///
/// Implemented by a zero-sized marker type; everything downstream (ports,
/// components, the kernel) is monomorphized over it.
pub trait KernelTypes: 'static {
    type Command: Copy + Default + Send + Sync + 'static;
    type SetPoint: Copy + Default + Send + Sync + 'static;
    type Input: Copy + Default + Send + Sync + 'static;
    type Model: Copy + Default + Send + Sync + 'static;
    type Output: Copy + Default + Send + Sync + 'static;
}

// ─── DataObject ─────────────────────────────────────────────────────

/// Latest value of one semantic channel.
pub struct DataObject<T> {
    name: String,
    prefix: String,
    version: AtomicU64,
    value: UnsafeCell<T>,
    readers: AtomicU32,
    writers: AtomicU32,
}

// SAFETY: all access to `value` is mediated by the version protocol; writers
// are serialized by the CAS on `version` and readers discard torn copies.
unsafe impl<T: Copy + Send> Sync for DataObject<T> {}

impl<T: Copy> DataObject<T> {
    /// Create a data object holding `initial`.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, initial: T) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            version: AtomicU64::new(0),
            value: UnsafeCell::new(initial),
            readers: AtomicU32::new(0),
            writers: AtomicU32::new(0),
        }
    }

    /// Publish a new value.
    ///
    /// Returns `false` without touching the value if another write is in
    /// progress. Never blocks.
    #[inline]
    pub fn set(&self, value: T) -> bool {
        let v = self.version.load(Ordering::Relaxed);
        if v % 2 != 0 {
            return false;
        }
        if self
            .version
            .compare_exchange(v, v + 1, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        fence(Ordering::Release);
        // SAFETY: the odd version grants exclusive write access.
        unsafe { core::ptr::write_volatile(self.value.get(), value) };
        self.version.store(v + 2, Ordering::Release);
        true
    }

    /// Read the value, giving up after [`MAX_READ_RETRIES`] torn reads.
    #[inline]
    pub fn try_get(&self) -> Option<T> {
        for _ in 0..MAX_READ_RETRIES {
            if let Some(value) = self.read_once() {
                return Some(value);
            }
            core::hint::spin_loop();
        }
        None
    }

    /// Read the value, spinning until a consistent copy is observed.
    #[inline]
    pub fn get(&self) -> T {
        loop {
            if let Some(value) = self.read_once() {
                return value;
            }
            core::hint::spin_loop();
        }
    }

    #[inline]
    fn read_once(&self) -> Option<T> {
        let before = self.version.load(Ordering::Acquire);
        if before % 2 != 0 {
            return None;
        }
        // SAFETY: a concurrent writer may overwrite the cell during the copy;
        // such a copy is detected by the version check below and discarded.
        let value = unsafe { core::ptr::read_volatile(self.value.get()) };
        fence(Ordering::Acquire);
        let after = self.version.load(Ordering::Relaxed);
        (before == after).then_some(value)
    }

    /// Number of completed writes.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire) / 2
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// External-lookup prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of read ports currently bound.
    pub fn reader_count(&self) -> u32 {
        self.readers.load(Ordering::Relaxed)
    }

    /// Number of write ports currently bound.
    pub fn writer_count(&self) -> u32 {
        self.writers.load(Ordering::Relaxed)
    }

    pub(crate) fn add_reader(&self) {
        self.readers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn remove_reader(&self) {
        let _ = self
            .readers
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub(crate) fn add_writer(&self) {
        self.writers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn remove_writer(&self) {
        let _ = self
            .writers
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }
}

impl<T: Copy + Default> DataObject<T> {
    /// Create a data object holding `T::default()`.
    pub fn with_default(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(name, prefix, T::default())
    }
}

impl<T: Copy + core::fmt::Debug> core::fmt::Debug for DataObject<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DataObject")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("version", &self.version())
            .field("value", &self.try_get())
            .finish()
    }
}

// ─── DataSlots ──────────────────────────────────────────────────────

/// The five data objects of a kernel, one per channel.
pub struct DataSlots<K: KernelTypes> {
    pub commands: Arc<DataObject<K::Command>>,
    pub setpoints: Arc<DataObject<K::SetPoint>>,
    pub inputs: Arc<DataObject<K::Input>>,
    pub models: Arc<DataObject<K::Model>>,
    pub outputs: Arc<DataObject<K::Output>>,
}

impl<K: KernelTypes> DataSlots<K> {
    /// Fresh default-valued data objects named `<kernel>::<Channel>`.
    pub fn new(kernel_name: &str, prefixes: &ChannelPrefixes) -> Self {
        let name = |ch: Channels| format!("{kernel_name}::{}", ch.object_name());
        Self {
            commands: Arc::new(DataObject::with_default(
                name(Channels::COMMANDS),
                prefixes.commands.as_str(),
            )),
            setpoints: Arc::new(DataObject::with_default(
                name(Channels::SETPOINTS),
                prefixes.setpoints.as_str(),
            )),
            inputs: Arc::new(DataObject::with_default(
                name(Channels::INPUTS),
                prefixes.inputs.as_str(),
            )),
            models: Arc::new(DataObject::with_default(
                name(Channels::MODELS),
                prefixes.models.as_str(),
            )),
            outputs: Arc::new(DataObject::with_default(
                name(Channels::OUTPUTS),
                prefixes.outputs.as_str(),
            )),
        }
    }
}

impl<K: KernelTypes> Clone for DataSlots<K> {
    fn clone(&self) -> Self {
        Self {
            commands: Arc::clone(&self.commands),
            setpoints: Arc::clone(&self.setpoints),
            inputs: Arc::clone(&self.inputs),
            models: Arc::clone(&self.models),
            outputs: Arc::clone(&self.outputs),
        }
    }
}

static_assertions::assert_impl_all!(DataObject<f64>: Send, Sync);
static_assertions::assert_impl_all!(DataObject<[u8; 64]>: Send, Sync);

// ─── Tests ──────────────────────────────────────────────────────────
