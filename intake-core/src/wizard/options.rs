/// The state of an externally resolved option list owned by a step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionSet<T> {
    #[default]
    NotRequested,
    Loading,
    Ready(Vec<T>),
    Failed(String),
}

impl<T> OptionSet<T> {
    /// The resolved items, if resolution has completed successfully.
    pub fn items(&self) -> Option<&[T]> {
        match self {
            Self::Ready(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn find(
        &self,
        predicate: impl Fn(&T) -> bool,
    ) -> Option<&T> {
        self.items()?.iter().find(|item| predicate(item))
    }
}
