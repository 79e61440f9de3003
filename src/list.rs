//! Recency list backing the LRU engine.
//!
//! A doubly linked list with sentinel (sigil) nodes at both ends. The node
//! right after the head sentinel is the most recently used entry, the node
//! right before the tail sentinel is the least recently used one. Nodes are
//! heap allocated and addressed by raw pointer so the index can jump straight
//! to them.

use alloc::boxed::Box;
use alloc::fmt;
use core::marker::PhantomData;
use core::mem;
use core::num::NonZeroUsize;
use core::ptr::{self, NonNull};

/// A node in the doubly linked list.
///
/// Contains a value and pointers to the previous and next entries.
/// This structure is not meant to be used directly by users of the `List`.
pub struct Entry<T> {
    /// The value stored in this entry. Uses MaybeUninit to allow for sigil nodes.
    val: mem::MaybeUninit<T>,
    /// Pointer to the previous entry in the list.
    prev: *mut Entry<T>,
    /// Pointer to the next entry in the list.
    next: *mut Entry<T>,
}

impl<T> Entry<T> {
    fn new(val: T) -> Self {
        Entry {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Creates a sentinel entry without initializing the value.
    fn new_sigil() -> Self {
        Entry {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Returns a reference to the value.
    ///
    /// # Safety
    ///
    /// Must only be called on non-sigil nodes.
    pub unsafe fn get_value(&self) -> &T {
        // SAFETY: caller guarantees this is not a sigil, so `val` is initialized
        unsafe { self.val.assume_init_ref() }
    }

    /// Returns a mutable reference to the value.
    ///
    /// # Safety
    ///
    /// Must only be called on non-sigil nodes.
    pub unsafe fn get_value_mut(&mut self) -> &mut T {
        // SAFETY: caller guarantees this is not a sigil, so `val` is initialized
        unsafe { self.val.assume_init_mut() }
    }

    /// Consumes a detached entry and returns its value.
    ///
    /// Entries handed out by [`List`] are never sigils, so the value is
    /// always initialized.
    pub fn into_value(self: Box<Self>) -> T {
        // SAFETY: sigils never leave the list; every other entry was built with `Entry::new`
        unsafe { self.val.assume_init_read() }
    }
}

/// A doubly linked list with a capacity bound.
///
/// `add` refuses to grow the list past `cap`; the capacity can be changed with
/// `set_cap`, which never removes entries on its own.
pub struct List<T> {
    /// Maximum number of items the list can hold.
    cap: NonZeroUsize,
    /// Current number of items in the list.
    len: usize,
    /// Pointer to the head sentinel node.
    head: *mut Entry<T>,
    /// Pointer to the tail sentinel node.
    tail: *mut Entry<T>,
}

impl<T> List<T> {
    /// Creates a new List that holds at most `cap` items.
    pub fn new(cap: NonZeroUsize) -> List<T> {
        let head = Box::into_raw(Box::new(Entry::new_sigil()));
        let tail = Box::into_raw(Box::new(Entry::new_sigil()));

        // SAFETY: head and tail are newly allocated and valid pointers
        unsafe {
            (*head).next = tail;
            (*tail).prev = head;
        }

        List {
            cap,
            len: 0,
            head,
            tail,
        }
    }

    /// Returns the maximum number of items the list can hold.
    pub fn cap(&self) -> NonZeroUsize {
        self.cap
    }

    /// Changes the capacity bound.
    ///
    /// Shrinking below `len` is allowed; it only makes `add` fail until the
    /// caller removes enough entries.
    pub fn set_cap(&mut self, cap: NonZeroUsize) {
        self.cap = cap;
    }

    /// Returns the current number of items in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list contains no items.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if the list holds `cap` or more items.
    pub fn is_full(&self) -> bool {
        self.len >= self.cap.get()
    }

    /// Returns the least recently attached node without detaching it.
    pub fn last(&self) -> Option<*mut Entry<T>> {
        // SAFETY: tail is a valid sentinel initialized in `new`
        let prev = unsafe { (*self.tail).prev };
        if prev == self.head {
            None
        } else {
            Some(prev)
        }
    }

    /// Removes the first (most recently used) item from the list.
    pub fn remove_first(&mut self) -> Option<Box<Entry<T>>> {
        // SAFETY: head is a valid sentinel initialized in `new`
        let next = unsafe { (*self.head).next };
        if next == self.tail {
            return None;
        }
        // SAFETY: next lies strictly between the sentinels, so it is a live node of this list
        unsafe {
            self.detach(next);
            self.len -= 1;
            Some(Box::from_raw(next))
        }
    }

    /// Removes the last (least recently used) item from the list.
    pub fn remove_last(&mut self) -> Option<Box<Entry<T>>> {
        let prev = self.last()?;
        // SAFETY: `last` only returns nodes strictly between the sentinels
        unsafe {
            self.detach(prev);
            self.len -= 1;
            Some(Box::from_raw(prev))
        }
    }

    /// Detaches `node` from the list and returns it as a Box.
    ///
    /// # Safety
    ///
    /// `node` must be a live, non-sigil node of this list.
    pub unsafe fn remove(&mut self, node: *mut Entry<T>) -> Option<Box<Entry<T>>> {
        if self.is_empty() || node.is_null() || node == self.head || node == self.tail {
            return None;
        }

        // SAFETY: caller guarantees node belongs to this list
        unsafe {
            self.detach(node);
            self.len -= 1;
            Some(Box::from_raw(node))
        }
    }

    /// Unlinks a node from its neighbours without deallocating it.
    ///
    /// # Safety
    ///
    /// `node` must be a live, non-sigil node of this list.
    unsafe fn detach(&mut self, node: *mut Entry<T>) {
        // SAFETY: node is linked, so its prev and next pointers are valid entries
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    /// Links a node right after the head sentinel.
    ///
    /// # Safety
    ///
    /// `node` must be valid and not currently linked into any list.
    unsafe fn attach(&mut self, node: *mut Entry<T>) {
        // SAFETY: head is valid and the caller guarantees node is unlinked
        unsafe {
            (*node).next = (*self.head).next;
            (*node).prev = self.head;
            (*self.head).next = node;
            (*(*node).next).prev = node;
        }
    }

    /// Moves a node to the front of the list.
    ///
    /// # Safety
    ///
    /// `node` must be a live node of this list.
    pub unsafe fn move_to_front(&mut self, node: *mut Entry<T>) {
        if node.is_null() || node == self.head || node == self.tail {
            return;
        }

        // SAFETY: caller guarantees node belongs to this list
        unsafe {
            if (*self.head).next == node {
                return;
            }
            self.detach(node);
            self.attach(node);
        }
    }

    /// Adds a value to the front of the list.
    ///
    /// Returns a pointer to the new entry, or `None` if the list is full.
    pub fn add(&mut self, v: T) -> Option<*mut Entry<T>> {
        if self.is_full() {
            return None;
        }
        let node = NonNull::from(Box::leak(Box::new(Entry::new(v))));
        // SAFETY: node is freshly allocated and not part of any list yet
        unsafe { self.attach(node.as_ptr()) };
        self.len += 1;
        Some(node.as_ptr())
    }

    /// Replaces the value stored in `node` and returns the previous one.
    ///
    /// The node keeps its position; callers reorder it separately.
    ///
    /// # Safety
    ///
    /// `node` must be a live, non-sigil node of this list.
    pub unsafe fn update(&mut self, node: *mut Entry<T>, v: T) -> T {
        // SAFETY: caller guarantees node is a non-sigil node, so `val` is initialized
        unsafe { mem::replace((*node).get_value_mut(), v) }
    }

    /// Removes and drops every entry.
    pub fn clear(&mut self) {
        while let Some(entry) = self.remove_first() {
            drop(entry.into_value());
        }
    }

    /// Iterates over the values from most to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            // SAFETY: head is a valid sentinel initialized in `new`
            next: unsafe { (*self.head).next },
            remaining: self.len,
            _marker: PhantomData,
        }
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();

        // SAFETY: head and tail were allocated in `new` and are freed exactly once here
        unsafe {
            drop(Box::from_raw(self.head));
            drop(Box::from_raw(self.tail));
        }
        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("capacity", &self.cap)
            .field("length", &self.len)
            .finish()
    }
}

/// Front-to-back iterator over a [`List`].
pub struct Iter<'a, T> {
    next: *mut Entry<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // SAFETY: `remaining` counts the live nodes ahead of `next`, and the shared
        // borrow of the list keeps them alive and unmodified for 'a
        unsafe {
            let node = self.next;
            self.next = (*node).next;
            Some((*node).get_value())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish()
    }
}
