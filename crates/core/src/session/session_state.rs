use crate::descriptor::domain::shape_descriptor::ShapeDescriptor;

/// Whether a reference shape has been captured yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ReferenceState {
    #[default]
    Empty,
    Holding(ShapeDescriptor),
}

/// In-memory store for the reference descriptor of one run.
///
/// Once holding a reference it never returns to empty; a save only ever
/// replaces it.
#[derive(Debug, Default)]
pub struct SessionState {
    reference: ReferenceState,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a copy of `current` as the reference. Returns `false` and
    /// leaves the state alone when `current` is empty.
    pub fn save(&mut self, current: &ShapeDescriptor) -> bool {
        if current.is_empty() {
            return false;
        }
        self.reference = ReferenceState::Holding(current.clone());
        true
    }

    pub fn has_reference(&self) -> bool {
        matches!(self.reference, ReferenceState::Holding(_))
    }

    pub fn get(&self) -> Option<&ShapeDescriptor> {
        match &self.reference {
            ReferenceState::Holding(d) => Some(d),
            ReferenceState::Empty => None,
        }
    }

    pub fn state(&self) -> &ReferenceState {
        &self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::point::Point;

    fn triangle(offset: i32) -> ShapeDescriptor {
        ShapeDescriptor::new(vec![
            Point::new(offset, 0),
            Point::new(offset + 10, 0),
            Point::new(offset + 5, 8),
        ])
    }

    #[test]
    fn test_starts_empty() {
        let session = SessionState::new();
        assert!(!session.has_reference());
        assert!(session.get().is_none());
        assert_eq!(session.state(), &ReferenceState::Empty);
    }

    #[test]
    fn test_save_holds_copy() {
        let mut session = SessionState::new();
        let d = triangle(0);
        assert!(session.save(&d));
        assert!(session.has_reference());
        assert_eq!(session.get(), Some(&d));
    }

    #[test]
    fn test_save_replaces_reference() {
        let mut session = SessionState::new();
        session.save(&triangle(0));
        session.save(&triangle(50));
        assert_eq!(session.get(), Some(&triangle(50)));
    }

    #[test]
    fn test_empty_save_is_noop_when_empty() {
        let mut session = SessionState::new();
        assert!(!session.save(&ShapeDescriptor::default()));
        assert_eq!(session.state(), &ReferenceState::Empty);
    }

    #[test]
    fn test_empty_save_keeps_existing_reference() {
        let mut session = SessionState::new();
        session.save(&triangle(3));
        assert!(!session.save(&ShapeDescriptor::default()));
        assert_eq!(session.get(), Some(&triangle(3)));
    }
}
