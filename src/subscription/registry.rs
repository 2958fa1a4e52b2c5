use smallvec::SmallVec;

/// Live registrations of a subject or a future, in subscription order.
///
/// An entry learns its id before it is stored (see [`next_id`]) so it can
/// later remove itself through a weak back-reference. Removed entries are
/// handed back to the caller, who drops them once its lock is released.
///
/// [`next_id`]: Registry::next_id
pub(crate) struct Registry<U> {
  last_id: usize,
  entries: SmallVec<[(usize, U); 2]>,
}

impl<U> Registry<U> {
  pub(crate) fn new() -> Self { Registry { last_id: 0, entries: SmallVec::new() } }

  /// Ids are never reused, so a stale registration cannot remove a newer one.
  pub(crate) fn next_id(&mut self) -> usize {
    self.last_id += 1;
    self.last_id
  }

  pub(crate) fn register(&mut self, id: usize, entry: U) { self.entries.push((id, entry)); }

  pub(crate) fn unregister(&mut self, id: usize) -> Option<U> {
    let pos = self.entries.iter().position(|(entry_id, _)| *entry_id == id)?;
    Some(self.entries.remove(pos).1)
  }

  /// Remove every entry for which `is_dead` holds.
  pub(crate) fn prune(&mut self, mut is_dead: impl FnMut(&U) -> bool) -> SmallVec<[U; 2]> {
    let mut dead = SmallVec::new();
    let mut i = 0;
    while i < self.entries.len() {
      if is_dead(&self.entries[i].1) {
        dead.push(self.entries.remove(i).1);
      } else {
        i += 1;
      }
    }
    dead
  }

  /// Empty the registry, returning the entries in order.
  pub(crate) fn take_all(&mut self) -> SmallVec<[U; 2]> {
    std::mem::take(&mut self.entries).into_iter().map(|(_, entry)| entry).collect()
  }

  pub(crate) fn entries(&self) -> impl Iterator<Item = &U> { self.entries.iter().map(|(_, e)| e) }

  pub(crate) fn len(&self) -> usize { self.entries.len() }

  pub(crate) fn is_empty(&self) -> bool { self.entries.is_empty() }
}
