// ==========================================
// Exam Planner - Reference Data API
// ==========================================
// Admin maintenance of rooms, slots and invigilators, plus the
// catalog listings the planning screens read. Deleting a room or
// slot is refused while a stored planning still references it.
// ==========================================

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::resources::{Department, ExamModule, Invigilator, Program, Room, Slot};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::reference_repo::ReferenceRepository;
use crate::repository::run_repo::AssignmentItemRepository;

// ==========================================
// ReferenceApi
// ==========================================
pub struct ReferenceApi {
    reference_repo: Arc<ReferenceRepository>,
    catalog_repo: Arc<CatalogRepository>,
    item_repo: Arc<AssignmentItemRepository>, // usage checks before deletes
}

impl ReferenceApi {
    pub fn new(
        reference_repo: Arc<ReferenceRepository>,
        catalog_repo: Arc<CatalogRepository>,
        item_repo: Arc<AssignmentItemRepository>,
    ) -> Self {
        Self {
            reference_repo,
            catalog_repo,
            item_repo,
        }
    }

    // ==========================================
    // Listings
    // ==========================================

    pub fn list_rooms(&self) -> ApiResult<Vec<Room>> {
        Ok(self.reference_repo.list_rooms()?)
    }

    pub fn list_slots(&self) -> ApiResult<Vec<Slot>> {
        Ok(self.reference_repo.list_slots()?)
    }

    pub fn list_invigilators(&self) -> ApiResult<Vec<Invigilator>> {
        Ok(self.reference_repo.list_invigilators()?)
    }

    pub fn list_departments(&self) -> ApiResult<Vec<Department>> {
        Ok(self.catalog_repo.list_departments()?)
    }

    pub fn list_programs(&self) -> ApiResult<Vec<Program>> {
        Ok(self.catalog_repo.list_programs()?)
    }

    pub fn list_modules(&self) -> ApiResult<Vec<ExamModule>> {
        Ok(self.catalog_repo.list_modules()?)
    }

    // ==========================================
    // Rooms
    // ==========================================

    /// Creates or updates a room. An empty id means create.
    ///
    /// # Returns
    /// - `Ok(Room)`: the saved row, with its id filled in
    pub fn save_room(&self, mut room: Room) -> ApiResult<Room> {
        if room.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("nom de salle requis".to_string()));
        }
        if room.room_id.trim().is_empty() {
            room.room_id = Uuid::new_v4().to_string();
        }

        self.reference_repo.upsert_room(&room)?;
        info!(room_id = %room.room_id, name = %room.name, "room saved");
        Ok(room)
    }

    /// Deletes a room, refusing while a planning still uses it.
    pub fn delete_room(&self, room_id: &str) -> ApiResult<Room> {
        let room = self
            .reference_repo
            .find_room(room_id)?
            .ok_or_else(|| ApiError::NotFound("Salle introuvable".to_string()))?;

        if self.item_repo.count_by_room(room_id)? > 0 {
            return Err(ApiError::ResourceInUse(
                "Salle utilisée dans un planning ou une autre ressource. \
                 Supprimez d’abord les éléments associés."
                    .to_string(),
            ));
        }

        self.reference_repo.delete_room(room_id)?;
        info!(room_id = %room_id, "room deleted");
        Ok(room)
    }

    // ==========================================
    // Slots
    // ==========================================

    /// Creates or updates a slot. An empty id means create.
    pub fn save_slot(&self, mut slot: Slot) -> ApiResult<Slot> {
        if slot.end_time <= slot.start_time {
            return Err(ApiError::InvalidInput(
                "heure de fin avant heure de début".to_string(),
            ));
        }
        if slot.slot_id.trim().is_empty() {
            slot.slot_id = Uuid::new_v4().to_string();
        }

        self.reference_repo.upsert_slot(&slot)?;
        info!(slot_id = %slot.slot_id, date = %slot.date, "slot saved");
        Ok(slot)
    }

    /// Deletes a slot, refusing while a planning still uses it.
    pub fn delete_slot(&self, slot_id: &str) -> ApiResult<Slot> {
        let slot = self
            .reference_repo
            .find_slot(slot_id)?
            .ok_or_else(|| ApiError::NotFound("Créneau introuvable".to_string()))?;

        if self.item_repo.count_by_slot(slot_id)? > 0 {
            return Err(ApiError::ResourceInUse(
                "Créneau utilisé dans un planning ou une autre ressource. \
                 Supprimez d’abord les éléments associés."
                    .to_string(),
            ));
        }

        self.reference_repo.delete_slot(slot_id)?;
        info!(slot_id = %slot_id, "slot deleted");
        Ok(slot)
    }

    // ==========================================
    // Invigilators
    // ==========================================

    /// Creates or updates an invigilator. An empty id means create.
    pub fn save_invigilator(&self, mut invigilator: Invigilator) -> ApiResult<Invigilator> {
        if invigilator.full_name.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "nom de surveillant requis".to_string(),
            ));
        }
        if invigilator.invigilator_id.trim().is_empty() {
            invigilator.invigilator_id = Uuid::new_v4().to_string();
        }

        self.reference_repo.upsert_invigilator(&invigilator)?;
        info!(invigilator_id = %invigilator.invigilator_id, "invigilator saved");
        Ok(invigilator)
    }
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::planning::{AssignmentItem, PlanningRun};
    use crate::domain::types::{RoomKind, RunScope};
    use crate::repository::run_repo::PlanningRunRepository;
    use chrono::{NaiveDate, NaiveTime};
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn create_test_api() -> (ReferenceApi, Arc<PlanningRunRepository>) {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let run_repo = Arc::new(PlanningRunRepository::from_connection(conn.clone()).unwrap());
        let reference_repo = Arc::new(ReferenceRepository::from_connection(conn.clone()).unwrap());
        let catalog_repo = Arc::new(CatalogRepository::from_connection(conn.clone()).unwrap());
        let item_repo = Arc::new(AssignmentItemRepository::from_connection(conn).unwrap());
        (
            ReferenceApi::new(reference_repo, catalog_repo, item_repo),
            run_repo,
        )
    }

    fn create_test_room(name: &str) -> Room {
        Room {
            room_id: String::new(),
            name: name.to_string(),
            building: "B1".to_string(),
            kind: RoomKind::Standard,
            normal_capacity: Some(40),
            exam_capacity: None,
        }
    }

    fn create_test_slot() -> Slot {
        Slot {
            slot_id: String::new(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_save_room_assigns_id_and_persists() {
        let (api, _) = create_test_api();

        let saved = api.save_room(create_test_room("Salle-1")).unwrap();
        assert!(!saved.room_id.is_empty());

        let rooms = api.list_rooms().unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].name, "Salle-1");
    }

    #[test]
    fn test_save_room_rejects_blank_name() {
        let (api, _) = create_test_api();

        let result = api.save_room(create_test_room("  "));
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_save_slot_rejects_inverted_window() {
        let (api, _) = create_test_api();

        let mut slot = create_test_slot();
        slot.end_time = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        let result = api.save_slot(slot);
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_delete_room_missing_is_not_found() {
        let (api, _) = create_test_api();

        let result = api.delete_room("nope");
        match result {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Salle introuvable"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_room_refused_while_planning_uses_it() {
        let (api, run_repo) = create_test_api();

        let room = api.save_room(create_test_room("Salle-1")).unwrap();
        let slot = api.save_slot(create_test_slot()).unwrap();

        let run = PlanningRun::new_running("RUN1", RunScope::Global, None, None, None, "admin");
        run_repo.create(&run).unwrap();
        api.item_repo
            .batch_insert(&[AssignmentItem {
                item_id: "I1".to_string(),
                run_id: "RUN1".to_string(),
                module_id: "M1".to_string(),
                room_id: room.room_id.clone(),
                slot_id: slot.slot_id.clone(),
                expected_students: 30,
                invigilators: vec![],
                annotation: None,
            }])
            .unwrap();

        let room_result = api.delete_room(&room.room_id);
        assert!(matches!(room_result, Err(ApiError::ResourceInUse(_))));

        let slot_result = api.delete_slot(&slot.slot_id);
        assert!(matches!(slot_result, Err(ApiError::ResourceInUse(_))));

        // both rows survive the refused deletes
        assert_eq!(api.list_rooms().unwrap().len(), 1);
        assert_eq!(api.list_slots().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_unused_room_succeeds() {
        let (api, _) = create_test_api();

        let room = api.save_room(create_test_room("Salle-1")).unwrap();
        let deleted = api.delete_room(&room.room_id).unwrap();
        assert_eq!(deleted.room_id, room.room_id);
        assert!(api.list_rooms().unwrap().is_empty());
    }

    #[test]
    fn test_save_invigilator_upserts_by_id() {
        let (api, _) = create_test_api();

        let first = api
            .save_invigilator(Invigilator {
                invigilator_id: "P1".to_string(),
                full_name: "Marie Martin".to_string(),
                department_id: None,
            })
            .unwrap();

        let updated = api
            .save_invigilator(Invigilator {
                invigilator_id: first.invigilator_id.clone(),
                full_name: "Marie Martin-Durand".to_string(),
                department_id: Some("D1".to_string()),
            })
            .unwrap();
        assert_eq!(updated.invigilator_id, first.invigilator_id);

        let listed = api.list_invigilators().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].full_name, "Marie Martin-Durand");
    }
}
