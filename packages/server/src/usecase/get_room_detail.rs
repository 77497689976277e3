//! UseCase: Room 詳細の取得

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::RoomQueryError;

/// Room 詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 指定された Room を返す
    ///
    /// # Errors
    ///
    /// * `RoomQueryError::InvalidRoomId` - room_id が RoomId として不正
    /// * `RoomQueryError::RoomNotFound` - Room が存在しない
    pub async fn execute(&self, room_id: String) -> Result<Room, RoomQueryError> {
        let room_id =
            RoomId::new(room_id).map_err(|e| RoomQueryError::InvalidRoomId(e.to_string()))?;
        self.repository
            .get_room(&room_id)
            .await
            .ok_or_else(|| RoomQueryError::RoomNotFound(room_id.into_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, DisplayName, Member, Timestamp},
        infrastructure::repository::InMemoryRoomRepository,
    };

    #[tokio::test]
    async fn test_get_room_detail_returns_existing_room() {
        // テスト項目: 存在する Room の詳細が取得できる
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        repository
            .join(
                RoomId::new("order-1".to_string()).unwrap(),
                ConnectionId::generate(),
                Member::new(
                    "guest".to_string(),
                    DisplayName::new("guest".to_string()).unwrap(),
                    Timestamp::new(1),
                ),
                Timestamp::new(1),
            )
            .await;
        let usecase = GetRoomDetailUseCase::new(repository);

        // when (操作):
        let room = usecase.execute("order-1".to_string()).await.unwrap();

        // then (期待する結果):
        assert_eq!(room.member_count(), 1);
    }

    #[tokio::test]
    async fn test_get_room_detail_missing_room() {
        // テスト項目: 存在しない Room は RoomNotFound になる
        // given (前提条件):
        let usecase = GetRoomDetailUseCase::new(Arc::new(InMemoryRoomRepository::default()));

        // when (操作):
        let result = usecase.execute("ghost".to_string()).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RoomQueryError::RoomNotFound("ghost".to_string()));
    }

    #[tokio::test]
    async fn test_get_room_detail_invalid_room_id() {
        // テスト項目: 不正な room_id は InvalidRoomId になる
        let usecase = GetRoomDetailUseCase::new(Arc::new(InMemoryRoomRepository::default()));
        let result = usecase.execute("r".repeat(200)).await;
        assert!(matches!(result, Err(RoomQueryError::InvalidRoomId(_))));
    }
}
