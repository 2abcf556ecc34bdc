use serde::{Deserialize, Serialize};

/// A payload that is either one `T` or a list of them, e.g. a REST response that is a single
/// JSON object or an array of objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SingleOrList<T> {
    Single(T),
    List(Vec<T>),
}

impl<T> SingleOrList<T> {
    pub fn len(&self) -> usize {
        match self {
            SingleOrList::Single(_) => 1,
            SingleOrList::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_list(&self) -> bool {
        matches!(self, SingleOrList::List(_))
    }
}
