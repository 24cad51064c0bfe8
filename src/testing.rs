// src/testing.rs
//
// In-memory stand-ins for the store traits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    db::{AreaStore, DistributorCensus},
    models::area::{Area, CITY, DISTRICT, NO_FATHER, PROVINCE},
};

pub fn area(id: i32, cn_id: i32, name: &str, father_id: i32, level: i16) -> Area {
    Area {
        id,
        cn_id,
        name: name.to_owned(),
        father_id,
        level,
        pinyin: String::new(),
        pinyin_initial: String::new(),
        is_direct_municipality: false,
        distributor_amount: 0,
    }
}

/// 北京 / 北京市 / 东城区 plus a regular province with two cities.
pub fn seeded_areas() -> Vec<Area> {
    let mut beijing_city = area(2, 110100, "北京市", 1, CITY);
    beijing_city.is_direct_municipality = true;
    vec![
        area(1, 110000, "北京", NO_FATHER, PROVINCE),
        beijing_city,
        area(3, 110101, "东城区", 2, DISTRICT),
        area(4, 110102, "西城区", 2, DISTRICT),
        area(10, 440000, "广东省", NO_FATHER, PROVINCE),
        area(11, 440100, "广州市", 10, CITY),
        area(12, 440106, "天河区", 11, DISTRICT),
        area(13, 440300, "深圳市", 10, CITY),
        area(14, 440305, "南山区", 13, DISTRICT),
    ]
}

#[derive(Default)]
pub struct FakeStore {
    areas: Mutex<HashMap<i32, Area>>,
    // (distributor id, address code, revoked)
    distributors: Mutex<Vec<(i32, i32, bool)>>,
    area_reads: AtomicUsize,
}

impl FakeStore {
    pub fn with_areas(areas: Vec<Area>) -> Self {
        let store = Self::default();
        store
            .areas
            .lock()
            .unwrap()
            .extend(areas.into_iter().map(|a| (a.id, a)));
        store
    }

    pub fn area(&self, id: i32) -> Area {
        self.areas.lock().unwrap()[&id].clone()
    }

    pub fn add_distributor(&self, id: i32, cn_id: i32) {
        self.distributors.lock().unwrap().push((id, cn_id, false));
    }

    pub fn move_distributor(&self, id: i32, cn_id: i32) {
        for entry in self.distributors.lock().unwrap().iter_mut() {
            if entry.0 == id {
                entry.1 = cn_id;
            }
        }
    }

    pub fn revoke_distributor(&self, id: i32) {
        for entry in self.distributors.lock().unwrap().iter_mut() {
            if entry.0 == id {
                entry.2 = true;
            }
        }
    }

    /// Lookups by row id so far.
    pub fn area_reads(&self) -> usize {
        self.area_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AreaStore for FakeStore {
    async fn area_by_id(&self, id: i32) -> Result<Option<Area>, AppError> {
        self.area_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.areas.lock().unwrap().get(&id).cloned())
    }

    async fn area_by_cn_id(&self, cn_id: i32) -> Result<Option<Area>, AppError> {
        Ok(self
            .areas
            .lock()
            .unwrap()
            .values()
            .find(|a| a.cn_id == cn_id)
            .cloned())
    }

    async fn children_of(&self, id: i32) -> Result<Vec<Area>, AppError> {
        let mut children: Vec<Area> = self
            .areas
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.father_id == id)
            .cloned()
            .collect();
        children.sort_by_key(|a| a.cn_id);
        Ok(children)
    }

    async fn set_distributor_amount(&self, id: i32, amount: i32) -> Result<(), AppError> {
        if let Some(area) = self.areas.lock().unwrap().get_mut(&id) {
            area.distributor_amount = amount;
        }
        Ok(())
    }
}

#[async_trait]
impl DistributorCensus for FakeStore {
    async fn count_active_in(&self, cn_ids: &[i32]) -> Result<i64, AppError> {
        let count = self
            .distributors
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, cn_id, revoked)| !revoked && cn_ids.contains(cn_id))
            .count();
        Ok(count as i64)
    }
}
