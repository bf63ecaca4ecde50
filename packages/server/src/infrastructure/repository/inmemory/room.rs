//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! ルーム表と逆引きインデックス（connection_id → room_id）を 1 つの Mutex で保護し、
//! 全ての変更とスナップショット取得を直列化します。
//!
//! プロセス再起動で状態は失われます（セッションは揮発的なので許容）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, DisplayName, Member, Room, RoomId, RoomRepository, Timestamp};

/// Registry state guarded by a single lock
#[derive(Debug, Default)]
struct RegistryState {
    /// room_id → Room（空のルームは保持しない）
    rooms: HashMap<RoomId, Room>,
    /// connection_id → room_id の逆引き
    room_index: HashMap<ConnectionId, RoomId>,
}

/// インメモリ Room Repository 実装
///
/// HashMap をインメモリ DB として使用する実装。
/// ドメイン層の RoomRepository trait を実装します（依存性の逆転）。
#[derive(Debug, Default)]
pub struct InMemoryRoomRepository {
    state: Mutex<RegistryState>,
}

impl InMemoryRoomRepository {
    /// 新しい空の InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        display_name: DisplayName,
    ) -> Member {
        let now = Timestamp::now();
        let member = Member::new(connection_id.clone(), display_name, now);

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.clone(), now))
            .add_member(member.clone());
        state.room_index.insert(connection_id, room_id);

        member
    }

    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(room) = state.rooms.get_mut(room_id) else {
            return false;
        };
        if !room.remove_member(connection_id) {
            return false;
        }
        if room.is_empty() {
            state.rooms.remove(room_id);
        }
        state.room_index.remove(connection_id);
        true
    }

    async fn snapshot_others(&self, room_id: &RoomId, exclude: &ConnectionId) -> Vec<Member> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(|room| room.members_except(exclude))
            .unwrap_or_default()
    }

    async fn snapshot_members(&self, room_id: &RoomId) -> Vec<Member> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(|room| room.members.clone())
            .unwrap_or_default()
    }

    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let state = self.state.lock().await;
        state.room_index.get(connection_id).cloned()
    }

    async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).cloned()
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let state = self.state.lock().await;
        let mut rooms: Vec<Room> = state.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - join / leave / snapshot / room_of の基本動作
    // - ルーム表と逆引きインデックスの整合性
    // - 空になったルームが即座に削除されること
    //
    // 【なぜこのテストが必要か】
    // - Registry はメンバーシップ状態の唯一の所有者であり、
    //   presence 通知の正しさはここでの整合性に依存する
    // ========================================

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn name(name: &str) -> DisplayName {
        DisplayName::new(name.to_string())
    }

    fn member_ids(members: &[Member]) -> Vec<String> {
        members
            .iter()
            .map(|m| m.connection_id.as_str().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_join_creates_room_and_returns_member() {
        // テスト項目: 未知のルームへの参加でルームが作成され、メンバーが返される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let member = repo.join(room("r1"), conn("A"), name("alice")).await;

        // then (期待する結果):
        assert_eq!(member.connection_id, conn("A"));
        assert_eq!(member.display_name, name("alice"));
        assert!(!member.muted);
        let stored = repo.get_room(&room("r1")).await.unwrap();
        assert_eq!(stored.members, vec![member]);
        assert_eq!(repo.room_of(&conn("A")).await, Some(room("r1")));
    }

    #[tokio::test]
    async fn test_snapshot_others_preserves_join_order() {
        // テスト項目: 自分以外のメンバーが参加順で返される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join(room("r1"), conn("A"), name("alice")).await;
        repo.join(room("r1"), conn("B"), name("bob")).await;
        repo.join(room("r1"), conn("C"), name("carol")).await;

        // when (操作):
        let others = repo.snapshot_others(&room("r1"), &conn("C")).await;

        // then (期待する結果):
        assert_eq!(member_ids(&others), vec!["A", "B"]);
        assert_eq!(others[0].display_name, name("alice"));
        assert!(!others[0].muted);
    }

    #[tokio::test]
    async fn test_snapshot_of_missing_room_is_empty() {
        // テスト項目: 存在しないルームのスナップショットは空
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let others = repo.snapshot_others(&room("nowhere"), &conn("A")).await;
        let members = repo.snapshot_members(&room("nowhere")).await;

        // then (期待する結果):
        assert!(others.is_empty());
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn test_leave_removes_member_and_index() {
        // テスト項目: 退出でメンバーと逆引きインデックスが削除される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join(room("r1"), conn("A"), name("alice")).await;
        repo.join(room("r1"), conn("B"), name("bob")).await;

        // when (操作):
        let removed = repo.leave(&room("r1"), &conn("A")).await;

        // then (期待する結果):
        assert!(removed);
        assert_eq!(member_ids(&repo.snapshot_members(&room("r1")).await), vec!["B"]);
        assert_eq!(repo.room_of(&conn("A")).await, None);
        assert_eq!(repo.room_of(&conn("B")).await, Some(room("r1")));
    }

    #[tokio::test]
    async fn test_leave_last_member_deletes_room() {
        // テスト項目: 最後のメンバーが退出するとルームが即座に削除される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join(room("r1"), conn("A"), name("alice")).await;

        // when (操作):
        repo.leave(&room("r1"), &conn("A")).await;

        // then (期待する結果):
        assert!(repo.get_room(&room("r1")).await.is_none());
        assert!(repo.list_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_leave_twice_returns_false() {
        // テスト項目: 同じ接続の二度目の退出は false を返す
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join(room("r1"), conn("A"), name("alice")).await;
        repo.join(room("r1"), conn("B"), name("bob")).await;

        // when (操作):
        let first = repo.leave(&room("r1"), &conn("A")).await;
        let second = repo.leave(&room("r1"), &conn("A")).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(member_ids(&repo.snapshot_members(&room("r1")).await), vec!["B"]);
    }

    #[tokio::test]
    async fn test_leave_wrong_room_is_noop() {
        // テスト項目: 所属していないルームからの退出は何もしない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join(room("r1"), conn("A"), name("alice")).await;
        repo.join(room("r2"), conn("B"), name("bob")).await;

        // when (操作):
        let removed = repo.leave(&room("r2"), &conn("A")).await;

        // then (期待する結果):
        assert!(!removed);
        assert_eq!(repo.room_of(&conn("A")).await, Some(room("r1")));
        assert_eq!(member_ids(&repo.snapshot_members(&room("r2")).await), vec!["B"]);
    }

    #[tokio::test]
    async fn test_membership_matches_joined_minus_left() {
        // テスト項目: join/leave の任意の列の後、メンバー集合は「参加して未退出の接続」と一致し、
        //            ルームはメンバーが存在する場合のみ存在する
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let script: &[(&str, bool)] = &[
            ("A", true),
            ("B", true),
            ("C", true),
            ("B", false),
            ("D", true),
            ("A", false),
            ("B", true),
            ("C", false),
            ("D", false),
            ("B", false),
            ("E", true),
        ];
        let mut expected: HashSet<String> = HashSet::new();

        for (id, is_join) in script {
            // when (操作):
            if *is_join {
                repo.join(room("r1"), conn(id), name(id)).await;
                expected.insert(id.to_string());
            } else {
                assert!(repo.leave(&room("r1"), &conn(id)).await);
                expected.remove(*id);
            }

            // then (期待する結果):
            let actual: HashSet<String> = member_ids(&repo.snapshot_members(&room("r1")).await)
                .into_iter()
                .collect();
            assert_eq!(actual, expected);
            assert_eq!(repo.get_room(&room("r1")).await.is_some(), !expected.is_empty());
        }
    }

    #[tokio::test]
    async fn test_list_rooms_sorted_by_id() {
        // テスト項目: ルーム一覧が ID 順で返される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.join(room("zeta"), conn("A"), name("alice")).await;
        repo.join(room("alpha"), conn("B"), name("bob")).await;

        // when (操作):
        let rooms = repo.list_rooms().await;

        // then (期待する結果):
        let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_concurrent_joins_and_leaves_stay_consistent() {
        // テスト項目: 並行した join/leave の後もルーム表と逆引きインデックスが整合している
        // given (前提条件):
        let repo = Arc::new(InMemoryRoomRepository::new());

        // when (操作): 50 接続が参加し、偶数番目だけが退出する
        let mut handles = Vec::new();
        for i in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let id = conn(&format!("c{i}"));
                repo.join(room("r1"), id.clone(), name("peer")).await;
                if i % 2 == 0 {
                    assert!(repo.leave(&room("r1"), &id).await);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果):
        let members = repo.snapshot_members(&room("r1")).await;
        assert_eq!(members.len(), 25);
        for i in 0..50 {
            let expected = (i % 2 == 1).then(|| room("r1"));
            assert_eq!(repo.room_of(&conn(&format!("c{i}"))).await, expected);
        }
    }
}
