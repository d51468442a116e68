use std::collections::VecDeque;

/// Newest-first list with a fixed cap; inserting past the cap drops the oldest
#[derive(Debug, Clone)]
pub struct Feed<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> Feed<T> {
    /// Builds a feed from entries already sorted newest-first
    pub fn from_newest_first(items: Vec<T>, capacity: usize) -> Self {
        let mut items = VecDeque::from(items);
        items.truncate(capacity);
        Self { capacity, items }
    }

    pub fn push_newest(&mut self, item: T) {
        self.items.push_front(item);
        self.items.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T: Clone> Feed<T> {
    /// Copies the `limit` newest entries, newest first
    pub fn head(&self, limit: usize) -> Vec<T> {
        self.items.iter().take(limit).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_newest_caps_and_drops_oldest() {
        let mut feed = Feed::from_newest_first(Vec::new(), 3);
        for i in 0..5 {
            feed.push_newest(i);
        }

        assert_eq!(feed.len(), 3);
        assert_eq!(feed.to_vec(), vec![4, 3, 2]);
        assert_eq!(feed.head(1), vec![4]);
    }

    #[test]
    fn test_from_newest_first_truncates() {
        let feed = Feed::from_newest_first(vec![9, 8, 7, 6], 2);
        assert_eq!(feed.to_vec(), vec![9, 8]);
        assert_eq!(feed.head(10), vec![9, 8]);
        assert_eq!(feed.head(1), vec![9]);
    }
}
