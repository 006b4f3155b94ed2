//! Domain types for the todo list.
//!
//! [`TodoState`] holds the ordered collection and the one-slot undo buffer.
//! Every mutation goes through its methods so the collection stays sorted
//! ascending by id and unique by id.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Unique identifier for a todo item
///
/// Ids come from wall-clock milliseconds and are the only sort key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TodoId(i64);

impl TodoId {
    /// Creates a `TodoId` from its raw value
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value carried on the wire
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for TodoId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item
///
/// `Clone` is a full deep copy; the undo buffer holds one detached clone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    id: TodoId,
    text: String,
    complete: bool,
}

impl Todo {
    /// Creates a new, incomplete todo
    #[must_use]
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            complete: false,
        }
    }

    /// Creates a todo with an explicit completion flag
    #[must_use]
    pub fn with_complete(id: TodoId, text: impl Into<String>, complete: bool) -> Self {
        Self {
            id,
            text: text.into(),
            complete,
        }
    }

    /// Unique identifier
    #[must_use]
    pub const fn id(&self) -> TodoId {
        self.id
    }

    /// Description, fixed at creation
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the todo is completed
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Total order by id ascending, the order of the store's collection
    ///
    /// Two todos with the same id compare equal here even when their text or
    /// completion differ, so this is kept apart from `PartialEq`.
    #[must_use]
    pub fn cmp_by_id(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }

    pub(crate) fn set_complete(&mut self, complete: bool) {
        self.complete = complete;
    }
}

/// State of the todo store
///
/// Holds the collection, the undo buffer, and the last id handed out.
/// Deserialized states are re-sorted and de-duplicated like
/// [`TodoState::with_todos`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredState")]
pub struct TodoState {
    todos: Vec<Todo>,
    last_deleted: Option<Todo>,
    last_issued: Option<TodoId>,
}

impl TodoState {
    /// Creates a new empty state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            todos: Vec::new(),
            last_deleted: None,
            last_issued: None,
        }
    }

    /// Creates a state pre-populated with `todos`
    ///
    /// The collection is sorted by id. When ids repeat, the first one wins.
    #[must_use]
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        let mut state = Self::new();
        for todo in todos {
            if state.get(todo.id).is_none() {
                state.insert(todo);
            }
        }
        state.last_issued = state.todos.last().map(Todo::id);
        state
    }

    /// The collection, sorted ascending by id
    #[must_use]
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.complete).count()
    }

    /// True when every todo is complete (vacuously true when empty)
    #[must_use]
    pub fn are_all_complete(&self) -> bool {
        self.todos.iter().all(|t| t.complete)
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.position(id).map(|index| &self.todos[index])
    }

    /// Whether the undo buffer holds a destroyed todo
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.last_deleted.is_some()
    }

    /// The todo an undo would restore
    #[must_use]
    pub const fn last_deleted(&self) -> Option<&Todo> {
        self.last_deleted.as_ref()
    }

    /// Hands out the id for a new todo
    ///
    /// The id is the clock reading unless that would not be strictly greater
    /// than the previous id, in which case it is the previous id plus one.
    /// Returns `None` once ids are exhausted at `i64::MAX`.
    pub(crate) fn allocate_id(&mut self, now_millis: i64) -> Option<TodoId> {
        let id = match self.last_issued {
            Some(last) if now_millis <= last.0 => TodoId(last.0.checked_add(1)?),
            _ => TodoId(now_millis),
        };
        self.last_issued = Some(id);
        Some(id)
    }

    /// Inserts keeping the collection sorted; replaces a todo with the same id
    pub(crate) fn insert(&mut self, todo: Todo) {
        match self.todos.binary_search_by(|existing| existing.cmp_by_id(&todo)) {
            Ok(index) => self.todos[index] = todo,
            Err(index) => self.todos.insert(index, todo),
        }
    }

    pub(crate) fn remove(&mut self, id: TodoId) -> Option<Todo> {
        let index = self.position(id)?;
        Some(self.todos.remove(index))
    }

    pub(crate) fn get_mut(&mut self, id: TodoId) -> Option<&mut Todo> {
        let index = self.position(id)?;
        self.todos.get_mut(index)
    }

    pub(crate) fn set_all_complete(&mut self, complete: bool) {
        for todo in &mut self.todos {
            todo.set_complete(complete);
        }
    }

    pub(crate) fn remove_completed(&mut self) -> usize {
        let before = self.todos.len();
        self.todos.retain(|t| !t.complete);
        before - self.todos.len()
    }

    pub(crate) fn buffer_deleted(&mut self, todo: Todo) {
        self.last_deleted = Some(todo);
    }

    pub(crate) fn take_deleted(&mut self) -> Option<Todo> {
        self.last_deleted.take()
    }

    fn position(&self, id: TodoId) -> Option<usize> {
        self.todos.binary_search_by_key(&id, Todo::id).ok()
    }
}

/// Serialized form of [`TodoState`], normalized on the way in
#[derive(Deserialize)]
struct StoredState {
    #[serde(default)]
    todos: Vec<Todo>,
    #[serde(default)]
    last_deleted: Option<Todo>,
    #[serde(default)]
    last_issued: Option<TodoId>,
}

impl From<StoredState> for TodoState {
    fn from(stored: StoredState) -> Self {
        let mut state = Self::with_todos(stored.todos);
        // A buffered todo whose id is live again could not be restored safely.
        state.last_deleted = stored
            .last_deleted
            .filter(|deleted| state.get(deleted.id).is_none());
        // Never hand out an id at or below one already issued.
        state.last_issued = state.last_issued.max(stored.last_issued);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_new_is_incomplete() {
        let todo = Todo::new(TodoId::new(1), "Test todo");
        assert_eq!(todo.id(), TodoId::new(1));
        assert_eq!(todo.text(), "Test todo");
        assert!(!todo.is_complete());
    }

    #[test]
    fn todo_clone_is_detached() {
        let mut original = Todo::new(TodoId::new(1), "Test");
        let copy = original.clone();
        original.set_complete(true);
        assert!(!copy.is_complete());
        assert_eq!(copy.text(), original.text());
    }

    #[test]
    fn with_todos_sorts_and_dedups() {
        let state = TodoState::with_todos([
            Todo::new(TodoId::new(30), "c"),
            Todo::new(TodoId::new(10), "a"),
            Todo::new(TodoId::new(20), "b"),
            Todo::new(TodoId::new(10), "duplicate"),
        ]);

        let ids: Vec<i64> = state.todos().iter().map(|t| t.id().as_i64()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(state.get(TodoId::new(10)).unwrap().text(), "a");
    }

    #[test]
    fn allocate_id_is_strictly_increasing() {
        let mut state = TodoState::new();
        assert_eq!(state.allocate_id(100), Some(TodoId::new(100)));
        // Same tick
        assert_eq!(state.allocate_id(100), Some(TodoId::new(101)));
        // Clock stepped backwards
        assert_eq!(state.allocate_id(50), Some(TodoId::new(102)));
        assert_eq!(state.allocate_id(200), Some(TodoId::new(200)));
    }

    #[test]
    fn allocate_id_continues_after_seeded_todos() {
        let mut state = TodoState::with_todos([Todo::new(TodoId::new(500), "seed")]);
        assert_eq!(state.allocate_id(10), Some(TodoId::new(501)));
    }

    #[test]
    fn allocate_id_stops_at_i64_max() {
        let mut state = TodoState::with_todos([Todo::new(TodoId::new(i64::MAX), "last")]);
        assert_eq!(state.allocate_id(0), None);
        assert_eq!(state.allocate_id(i64::MAX), None);
    }

    #[test]
    fn sorting_by_id_orders_todos() {
        let mut todos = vec![
            Todo::new(TodoId::new(30), "c"),
            Todo::with_complete(TodoId::new(10), "a", true),
            Todo::new(TodoId::new(20), "b"),
        ];
        todos.sort_by(Todo::cmp_by_id);

        let ids: Vec<i64> = todos.iter().map(|t| t.id().as_i64()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(
            Todo::new(TodoId::new(1), "x").cmp_by_id(&Todo::with_complete(TodoId::new(1), "y", true)),
            Ordering::Equal
        );
    }

    #[test]
    fn deserialize_normalizes_collection() {
        let json = r#"{
            "todos": [
                {"id": 3, "text": "c", "complete": false},
                {"id": 1, "text": "a", "complete": true},
                {"id": 1, "text": "dup", "complete": false}
            ],
            "last_deleted": {"id": 3, "text": "stale", "complete": false},
            "last_issued": 2
        }"#;
        let mut state: TodoState = serde_json::from_str(json).unwrap();

        let ids: Vec<i64> = state.todos().iter().map(|t| t.id().as_i64()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(state.get(TodoId::new(1)).unwrap().text(), "a");
        assert!(!state.can_undo());
        // Continues after the largest live id, not the stale counter.
        assert_eq!(state.allocate_id(0), Some(TodoId::new(4)));
    }

    #[test]
    fn deserialize_keeps_valid_undo_buffer() {
        let state = TodoState::with_todos([Todo::new(TodoId::new(2), "b")]);
        let mut with_buffer = state.clone();
        with_buffer.buffer_deleted(Todo::new(TodoId::new(1), "a"));

        let json = serde_json::to_string(&with_buffer).unwrap();
        let restored: TodoState = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, with_buffer);
        assert_eq!(restored.last_deleted().unwrap().text(), "a");
    }

    #[test]
    fn todo_state_count() {
        let mut state = TodoState::new();
        assert_eq!(state.count(), 0);
        assert_eq!(state.completed_count(), 0);
        assert!(state.are_all_complete());

        state.insert(Todo::new(TodoId::new(2), "Todo 2"));
        state.insert(Todo::with_complete(TodoId::new(1), "Todo 1", true));

        assert_eq!(state.count(), 2);
        assert_eq!(state.completed_count(), 1);
        assert!(!state.are_all_complete());
        assert_eq!(state.todos()[0].id(), TodoId::new(1));
    }

    #[test]
    fn insert_replaces_same_id() {
        let mut state = TodoState::new();
        state.insert(Todo::new(TodoId::new(1), "old"));
        state.insert(Todo::new(TodoId::new(1), "new"));
        assert_eq!(state.count(), 1);
        assert_eq!(state.todos()[0].text(), "new");
    }
}
