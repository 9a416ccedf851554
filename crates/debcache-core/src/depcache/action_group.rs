use std::ops::{Deref, DerefMut};

use super::DepCache;

/// Scope that batches marks.
///
/// While any group is alive, marks refresh only the package they touch.
/// When the outermost group is dropped (or released), the cache runs one
/// full update. Groups nest.
///
/// ```rust,ignore
/// let mut group = depcache.action_group();
/// for pkg in wanted {
///     group.mark_install(pkg, true, true);
/// }
/// group.release();
/// ```
#[derive(Debug)]
pub struct ActionGroup<'a> {
    cache: &'a mut DepCache,
}

impl<'a> ActionGroup<'a> {
    pub(crate) fn new(cache: &'a mut DepCache) -> Self {
        cache.group_level += 1;
        Self { cache }
    }

    /// End the group now instead of at the end of scope
    pub fn release(self) {}
}

impl Deref for ActionGroup<'_> {
    type Target = DepCache;

    fn deref(&self) -> &DepCache {
        self.cache
    }
}

impl DerefMut for ActionGroup<'_> {
    fn deref_mut(&mut self) -> &mut DepCache {
        self.cache
    }
}

impl Drop for ActionGroup<'_> {
    fn drop(&mut self) {
        self.cache.group_level -= 1;
        if self.cache.group_level == 0 {
            self.cache.update();
        }
    }
}
