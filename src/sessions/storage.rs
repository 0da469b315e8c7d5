use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::storage::{keys, KeyValueStore, Result, StorageError};
use crate::tree::TreeNode;

use super::models::*;

/// Storage for learning sessions and the current-session pointer.
///
/// Every mutation reads the whole session map, changes it in place and
/// writes it back. Concurrent writers (two tabs over the same store) race
/// under last-write-wins; that limitation is accepted, not worked around.
pub struct SessionStorage {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load_map(&self) -> Result<HashMap<Uuid, Session>> {
        let raw = match self.store.get(keys::SESSIONS)? {
            Some(raw) => raw,
            None => return Ok(HashMap::new()),
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(err) => {
                log::warn!("Session map unreadable, starting empty: {}", err);
                Ok(HashMap::new())
            }
        }
    }

    fn save_map(&self, map: &HashMap<Uuid, Session>) -> Result<()> {
        self.store.set(keys::SESSIONS, &serde_json::to_string(map)?)
    }

    fn current_id(&self) -> Result<Option<Uuid>> {
        let raw = match self.store.get(keys::CURRENT_SESSION)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str(&raw) {
            Ok(id) => Ok(Some(id)),
            Err(err) => {
                log::warn!("Current session pointer unreadable: {}", err);
                Ok(None)
            }
        }
    }

    fn set_pointer(&self, id: Uuid) -> Result<()> {
        self.store
            .set(keys::CURRENT_SESSION, &serde_json::to_string(&id)?)
    }

    /// Load the current session, create one if the pointer is unset or
    /// dangling, apply `f`, bump `updatedAt` and persist.
    fn with_current<T>(&self, f: impl FnOnce(&mut Session) -> T) -> Result<(Session, T)> {
        let mut map = self.load_map()?;
        let mut session = match self.current_id()?.and_then(|id| map.remove(&id)) {
            Some(session) => session,
            None => {
                let session = Session::new(DEFAULT_TITLE);
                self.set_pointer(session.id)?;
                session
            }
        };
        let value = f(&mut session);
        session.updated_at = Utc::now();
        map.insert(session.id, session.clone());
        self.save_map(&map)?;
        Ok((session, value))
    }

    /// Create a session, persist it and make it current.
    pub fn create(&self, title: Option<&str>) -> Result<Session> {
        let session = Session::new(title.unwrap_or(DEFAULT_TITLE));
        let mut map = self.load_map()?;
        map.insert(session.id, session.clone());
        self.save_map(&map)?;
        self.set_pointer(session.id)?;
        Ok(session)
    }

    pub fn get(&self, id: Uuid) -> Result<Session> {
        self.load_map()?
            .remove(&id)
            .ok_or(StorageError::SessionNotFound(id))
    }

    /// Resolve the current session. An unset or dangling pointer is repaired
    /// by creating a fresh session, so this never reports "no session."
    pub fn current(&self) -> Result<Session> {
        if let Some(id) = self.current_id()? {
            if let Some(session) = self.load_map()?.get(&id) {
                return Ok(session.clone());
            }
            log::warn!("Current session {} no longer exists, creating a new one", id);
        }
        self.create(None)
    }

    /// Make an existing session current.
    pub fn set_current(&self, id: Uuid) -> Result<Session> {
        let session = self.get(id)?;
        self.set_pointer(id)?;
        Ok(session)
    }

    /// All sessions, most recently updated first.
    pub fn list(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self.load_map()?.into_values().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Lightweight rows for the sidebar, most recently updated first.
    pub fn list_summaries(&self) -> Result<Vec<SessionSummary>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|session| SessionSummary {
                id: session.id,
                title: session.title,
                target_topic: session.target_topic,
                message_count: session.chat_history.len(),
                created_at: session.created_at,
                updated_at: session.updated_at,
            })
            .collect())
    }

    /// Shallow-merge `patch` into the current session. Returns `None`
    /// without touching storage when the pointer is unset or dangling;
    /// that is a caller sequencing defect, not a normal outcome.
    pub fn update(&self, patch: SessionPatch) -> Result<Option<Session>> {
        let Some(id) = self.current_id()? else {
            log::warn!("Session update with no current session pointer, dropping it");
            return Ok(None);
        };
        let mut map = self.load_map()?;
        let Some(session) = map.get_mut(&id) else {
            log::warn!("Session update for missing session {}, dropping it", id);
            return Ok(None);
        };
        patch.apply_to(session);
        session.updated_at = Utc::now();
        let session = session.clone();
        self.save_map(&map)?;
        Ok(Some(session))
    }

    /// Rename the current session.
    pub fn retitle(&self, title: &str) -> Result<Option<Session>> {
        self.update(SessionPatch {
            title: Some(title.to_string()),
            ..Default::default()
        })
    }

    /// Remove a session. When the current one is removed the pointer moves
    /// to the most recently updated survivor, or to a fresh session when
    /// none remain.
    pub fn delete(&self, id: Uuid) -> Result<()> {
        let mut map = self.load_map()?;
        map.remove(&id);
        self.save_map(&map)?;

        if self.current_id()? == Some(id) {
            match map.values().max_by_key(|s| s.updated_at).map(|s| s.id) {
                Some(next) => self.set_pointer(next)?,
                None => {
                    self.create(None)?;
                }
            }
        }
        Ok(())
    }

    /// Append a display message to the current session, enforcing the
    /// retention window.
    pub fn append_message(&self, role: MessageRole, content: &str, kind: &str) -> Result<Session> {
        let message = ChatMessage::new(role, content, kind);
        let (session, _) = self.with_current(|s| s.push_message(message))?;
        Ok(session)
    }

    /// Append a structured turn to the current session, assigning the next
    /// turn number and stamping the timestamp.
    pub fn append_turn(&self, data: TurnData) -> Result<ConversationTurn> {
        let (_, turn) = self.with_current(|s| s.next_turn(data))?;
        Ok(turn)
    }

    /// Fold a newly-taught topic's tree into the current session.
    pub fn merge_topic_tree(&self, tree: TreeNode, topic: &str) -> Result<Session> {
        let (session, _) = self.with_current(|s| s.merge_topic_tree(tree, topic.to_string()))?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use crate::tree::{NodeKind, SENTINEL_TOPIC};
    use tempfile::TempDir;

    fn create_test_storage() -> (SessionStorage, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionStorage::new(store.clone()), store)
    }

    #[test]
    fn test_create_sets_current() {
        let (storage, _) = create_test_storage();

        let session = storage.create(Some("Algebra")).unwrap();

        assert_eq!(session.title, "Algebra");
        assert_eq!(storage.current().unwrap().id, session.id);
    }

    #[test]
    fn test_current_creates_session_on_first_use() {
        let (storage, _) = create_test_storage();

        let first = storage.current().unwrap();
        let second = storage.current().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.title, DEFAULT_TITLE);
        assert_eq!(storage.list().unwrap().len(), 1);
    }

    #[test]
    fn test_current_recovers_from_dangling_pointer() {
        let (storage, store) = create_test_storage();
        let orphan = Uuid::new_v4();
        store
            .set(
                keys::CURRENT_SESSION,
                &serde_json::to_string(&orphan).unwrap(),
            )
            .unwrap();

        let session = storage.current().unwrap();

        assert_ne!(session.id, orphan);
        assert_eq!(storage.current().unwrap().id, session.id);
    }

    #[test]
    fn test_get_unknown_session_errors() {
        let (storage, _) = create_test_storage();
        let id = Uuid::new_v4();

        assert!(matches!(
            storage.get(id),
            Err(StorageError::SessionNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_list_orders_by_most_recent_update() {
        let (storage, _) = create_test_storage();
        let a = storage.create(Some("a")).unwrap();
        let b = storage.create(Some("b")).unwrap();

        let listed = storage.list().unwrap();
        assert_eq!(listed[0].id, b.id);
        assert_eq!(listed[1].id, a.id);

        // Touching a moves it back to the front
        storage.set_current(a.id).unwrap();
        storage
            .append_message(MessageRole::User, "hello", "message")
            .unwrap();
        assert_eq!(storage.list().unwrap()[0].id, a.id);

        let summaries = storage.list_summaries().unwrap();
        assert_eq!(summaries[0].message_count, 1);
    }

    #[test]
    fn test_update_without_current_pointer_is_noop() {
        let (storage, _) = create_test_storage();

        let result = storage
            .update(SessionPatch {
                current_index: Some(5),
                ..Default::default()
            })
            .unwrap();

        assert!(result.is_none());
        assert!(storage.list().unwrap().is_empty());
    }

    #[test]
    fn test_update_patches_current_session() {
        let (storage, _) = create_test_storage();
        storage.create(None).unwrap();

        let updated = storage
            .update(SessionPatch {
                current_index: Some(2),
                waiting_for_synthesis: Some(true),
                current_question: Some("Why?".to_string()),
                ..Default::default()
            })
            .unwrap()
            .unwrap();

        assert_eq!(updated.current_index, 2);
        assert!(updated.waiting_for_synthesis);
        assert_eq!(storage.current().unwrap().current_question.as_deref(), Some("Why?"));
    }

    #[test]
    fn test_delete_current_repoints_to_most_recent_survivor() {
        let (storage, _) = create_test_storage();
        let a = storage.create(Some("a")).unwrap();
        let b = storage.create(Some("b")).unwrap();
        let c = storage.create(Some("c")).unwrap();

        storage.delete(c.id).unwrap();

        assert_eq!(storage.current().unwrap().id, b.id);
        let remaining: Vec<Uuid> = storage.list().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(remaining, vec![b.id, a.id]);
    }

    #[test]
    fn test_delete_last_session_creates_replacement() {
        let (storage, _) = create_test_storage();
        let only = storage.create(None).unwrap();

        storage.delete(only.id).unwrap();

        let current = storage.current().unwrap();
        assert_ne!(current.id, only.id);
        assert_eq!(storage.list().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_other_session_keeps_pointer() {
        let (storage, _) = create_test_storage();
        let a = storage.create(Some("a")).unwrap();
        let b = storage.create(Some("b")).unwrap();

        storage.delete(a.id).unwrap();

        assert_eq!(storage.current().unwrap().id, b.id);
    }

    #[test]
    fn test_append_message_enforces_retention_window() {
        let (storage, _) = create_test_storage();

        for i in 0..=HISTORY_RETENTION {
            storage
                .append_message(MessageRole::Bot, &i.to_string(), "message")
                .unwrap();
        }

        let history = storage.current().unwrap().chat_history;
        assert_eq!(history.len(), HISTORY_RETENTION);
        assert_eq!(history[0].content, "1");
        assert_eq!(
            history.last().map(|m| m.content.clone()),
            Some(HISTORY_RETENTION.to_string())
        );
    }

    #[test]
    fn test_append_turn_assigns_numbers_and_persists() {
        let (storage, _) = create_test_storage();

        let first = storage
            .append_turn(TurnData {
                concepts: vec!["sets".to_string()],
                correct: Some(true),
                ..Default::default()
            })
            .unwrap();
        let second = storage.append_turn(TurnData::default()).unwrap();

        assert_eq!(first.turn_number, 1);
        assert_eq!(second.turn_number, 2);

        let session = storage.current().unwrap();
        assert_eq!(session.turn_counter, 2);
        assert_eq!(session.conversation_turns.len(), 2);
        assert_eq!(session.conversation_turns[0].correct, Some(true));
    }

    #[test]
    fn test_merge_two_topics_through_storage() {
        let (storage, _) = create_test_storage();

        storage
            .merge_topic_tree(TreeNode::new("Sets", NodeKind::Root), "Sets")
            .unwrap();
        let session = storage
            .merge_topic_tree(TreeNode::new("Groups", NodeKind::Root), "Groups")
            .unwrap();

        let tree = session.tree.unwrap();
        assert_eq!(tree.topic, SENTINEL_TOPIC);
        assert_eq!(tree.children.len(), 2);
        assert_eq!(session.all_topics, vec!["Sets", "Groups"]);

        // Persisted, not just returned
        let reloaded = storage.current().unwrap();
        assert_eq!(reloaded.all_topics, vec!["Sets", "Groups"]);
    }

    #[test]
    fn test_corrupt_session_map_starts_empty() {
        let (storage, store) = create_test_storage();
        store.set(keys::SESSIONS, "not json").unwrap();

        assert!(storage.list().unwrap().is_empty());

        storage.create(Some("fresh")).unwrap();
        assert_eq!(storage.list().unwrap().len(), 1);
    }

    #[test]
    fn test_sessions_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let id = {
            let store = FileStore::new(temp_dir.path().to_path_buf()).unwrap();
            let storage = SessionStorage::new(Arc::new(store));
            let session = storage.create(Some("Algebra")).unwrap();
            storage
                .append_message(MessageRole::User, "Learn: Sets", "message")
                .unwrap();
            session.id
        };

        let store = FileStore::new(temp_dir.path().to_path_buf()).unwrap();
        let storage = SessionStorage::new(Arc::new(store));
        let session = storage.current().unwrap();

        assert_eq!(session.id, id);
        assert_eq!(session.chat_history.len(), 1);
    }
}
