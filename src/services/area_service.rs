// src/services/area_service.rs

use std::collections::{HashMap, HashSet};
use std::path::Path;

use sqlx::PgPool;

use crate::{
    common::{
        error::{AppError, IntegrityError},
        lazy::Lazy,
    },
    db::{AddressRepository, AreaRepository, AreaStore, DistributorCensus, DistributorRepository},
    models::{
        address::{Address, AddressOwner, FormattedAddress},
        area::{Area, AreaSeed, CITY, DISTRICT, PROVINCE},
        distributor::{CityDistributors, DistributorProfile},
    },
};

/// A root sits `DISTRICT - PROVINCE` hops above the deepest leaf.
const MAX_HOPS: usize = (DISTRICT - PROVINCE) as usize;

/// An area row with its neighbours resolved on first use.
#[derive(Debug)]
pub struct AreaNode {
    area: Area,
    father: Lazy<Option<Area>>,
    children: Lazy<Vec<Area>>,
}

impl From<Area> for AreaNode {
    fn from(area: Area) -> Self {
        Self::new(area)
    }
}

impl AreaNode {
    pub fn new(area: Area) -> Self {
        Self {
            area,
            father: Lazy::new(),
            children: Lazy::new(),
        }
    }

    /// Parent area, `None` for a province.
    pub async fn father<S>(&self, store: &S) -> Result<Option<&Area>, AppError>
    where
        S: AreaStore + ?Sized,
    {
        let father = self
            .father
            .get_or_resolve(|| resolve_father(store, &self.area))
            .await?;
        Ok(father.as_ref())
    }

    /// Direct children, empty for a district.
    pub async fn children<S>(&self, store: &S) -> Result<&[Area], AppError>
    where
        S: AreaStore + ?Sized,
    {
        let children = self
            .children
            .get_or_resolve(|| async {
                if self.area.level == DISTRICT {
                    return Ok(Vec::new());
                }
                store.children_of(self.area.id).await
            })
            .await?;
        Ok(children.as_slice())
    }

    /// The city this area belongs to: itself at city level, its father at
    /// district level, `None` for a province.
    pub async fn city<S>(&self, store: &S) -> Result<Option<&Area>, AppError>
    where
        S: AreaStore + ?Sized,
    {
        match self.area.level {
            CITY => Ok(Some(&self.area)),
            PROVINCE => Ok(None),
            _ => self.father(store).await,
        }
    }

    /// `[root, ..., self]`. Its length equals the area's level.
    pub async fn ancestor_chain<S>(&self, store: &S) -> Result<Vec<Area>, AppError>
    where
        S: AreaStore + ?Sized,
    {
        let mut chain = vec![self.area.clone()];
        let mut visited = HashSet::from([self.area.id]);
        let mut next = self.father(store).await?.cloned();
        let mut hops = 0;

        while let Some(ancestor) = next {
            hops += 1;
            if hops > MAX_HOPS || !visited.insert(ancestor.id) {
                return Err(IntegrityError::HierarchyCycle { area_id: ancestor.id }.into());
            }
            next = resolve_father(store, &ancestor).await?;
            chain.push(ancestor);
        }

        chain.reverse();
        Ok(chain)
    }

    pub async fn vague_address<S>(&self, store: &S) -> Result<String, AppError>
    where
        S: AreaStore + ?Sized,
    {
        Ok(join_chain(&self.ancestor_chain(store).await?))
    }

    /// Vague address followed by the street detail, with no separator.
    pub async fn precise_address<S>(&self, store: &S, detail: &str) -> Result<String, AppError>
    where
        S: AreaStore + ?Sized,
    {
        let mut address = self.vague_address(store).await?;
        address.push_str(detail);
        Ok(address)
    }

    /// Forgets resolved neighbours.
    pub fn invalidate(&mut self) {
        self.father.invalidate();
        self.children.invalidate();
    }
}

async fn resolve_father<S>(store: &S, area: &Area) -> Result<Option<Area>, AppError>
where
    S: AreaStore + ?Sized,
{
    if area.is_root() {
        if area.level != PROVINCE {
            return Err(IntegrityError::LevelMismatch {
                area_id: area.id,
                level: area.level,
                father_id: area.father_id,
                father_level: 0,
            }
            .into());
        }
        return Ok(None);
    }

    let father = store
        .area_by_id(area.father_id)
        .await?
        .ok_or(IntegrityError::OrphanArea {
            area_id: area.id,
            father_id: area.father_id,
        })?;

    if father.level != area.level - 1 {
        return Err(IntegrityError::LevelMismatch {
            area_id: area.id,
            level: area.level,
            father_id: father.id,
            father_level: father.level,
        }
        .into());
    }
    Ok(Some(father))
}

// Municipality city nodes repeat the province name and are left out.
fn join_chain(chain: &[Area]) -> String {
    chain
        .iter()
        .filter(|area| !area.is_direct_municipality)
        .map(|area| area.name.as_str())
        .collect()
}

/// Looks up a stored address code. An unknown code here is corrupt data.
pub async fn node_for_code<S>(store: &S, cn_id: i32) -> Result<AreaNode, AppError>
where
    S: AreaStore + ?Sized,
{
    let area = store
        .area_by_cn_id(cn_id)
        .await?
        .ok_or(IntegrityError::UnknownAreaCode { cn_id })?;
    Ok(AreaNode::new(area))
}

pub async fn format_address<S>(store: &S, address: &Address) -> Result<FormattedAddress, AppError>
where
    S: AreaStore + ?Sized,
{
    let node = node_for_code(store, address.cn_id).await?;
    let vague = node.vague_address(store).await?;
    let precise = node.precise_address(store, &address.address).await?;
    Ok(FormattedAddress {
        cn_id: address.cn_id,
        detail: address.address.clone(),
        vague,
        precise,
        longitude: address.longitude,
        latitude: address.latitude,
    })
}

/// Checks a client-supplied address code: it must exist, sit below a
/// province and have no children.
pub async fn require_leaf<S>(store: &S, cn_id: i32) -> Result<Area, AppError>
where
    S: AreaStore + ?Sized,
{
    let Some(area) = store.area_by_cn_id(cn_id).await? else {
        return Err(AppError::invalid_field("cnId", "unknown_area", "Unknown area code."));
    };
    // A childless province has no city to count distributors against.
    if area.level == PROVINCE {
        return Err(AppError::invalid_field(
            "cnId",
            "not_leaf",
            "Pick a city or district, not a province.",
        ));
    }
    let node = AreaNode::new(area);
    if !node.children(store).await?.is_empty() {
        return Err(AppError::invalid_field(
            "cnId",
            "not_leaf",
            "Pick a district, not a province or city.",
        ));
    }
    Ok(node.area)
}

/// Recomputes the cached distributor count of the city containing `cn_id`:
/// active distributors located in the city itself or one of its direct
/// children. Returns the new count.
///
/// Read-then-write: two concurrent recomputes for the same city may leave a
/// stale count until the next write there.
pub async fn update_distributor_amount<S>(store: &S, cn_id: i32) -> Result<i32, AppError>
where
    S: AreaStore + DistributorCensus + ?Sized,
{
    let node = node_for_code(store, cn_id).await?;
    let city = node
        .city(store)
        .await?
        .cloned()
        .ok_or(IntegrityError::NotCityScoped { cn_id })?;

    let city_node = AreaNode::new(city);
    let mut codes = vec![city_node.area.cn_id];
    codes.extend(city_node.children(store).await?.iter().map(|a| a.cn_id));

    let amount = store.count_active_in(&codes).await?;
    let amount = i32::try_from(amount).map_err(|e| anyhow::anyhow!(e))?;
    store.set_distributor_amount(city_node.area.id, amount).await?;

    tracing::debug!(city = %city_node.area.name, amount, "distributor amount recomputed");
    Ok(amount)
}

/// Validates imported rows as a whole before any of them is written.
pub fn validate_hierarchy(areas: &[Area]) -> Result<(), IntegrityError> {
    let by_id: HashMap<i32, &Area> = areas.iter().map(|a| (a.id, a)).collect();

    for area in areas {
        let mut current: &Area = area;
        let mut visited = HashSet::from([current.id]);
        let mut hops = 0;

        while !current.is_root() {
            let father = by_id
                .get(&current.father_id)
                .copied()
                .ok_or(IntegrityError::OrphanArea {
                    area_id: current.id,
                    father_id: current.father_id,
                })?;
            if father.level != current.level - 1 {
                return Err(IntegrityError::LevelMismatch {
                    area_id: current.id,
                    level: current.level,
                    father_id: father.id,
                    father_level: father.level,
                });
            }
            hops += 1;
            if hops > MAX_HOPS || !visited.insert(father.id) {
                return Err(IntegrityError::HierarchyCycle { area_id: father.id });
            }
            current = father;
        }

        if current.level != PROVINCE {
            return Err(IntegrityError::LevelMismatch {
                area_id: current.id,
                level: current.level,
                father_id: current.father_id,
                father_level: 0,
            });
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct AreaService {
    pool: PgPool,
    area_repo: AreaRepository,
    address_repo: AddressRepository,
    distributor_repo: DistributorRepository,
}

impl AreaService {
    pub fn new(
        pool: PgPool,
        area_repo: AreaRepository,
        address_repo: AddressRepository,
        distributor_repo: DistributorRepository,
    ) -> Self {
        Self {
            pool,
            area_repo,
            address_repo,
            distributor_repo,
        }
    }

    pub async fn provinces(&self) -> Result<Vec<Area>, AppError> {
        self.area_repo.list_roots().await
    }

    pub async fn by_code(&self, cn_id: i32) -> Result<Area, AppError> {
        self.area_repo
            .area_by_cn_id(cn_id)
            .await?
            .ok_or(AppError::NotFound("area"))
    }

    pub async fn children(&self, cn_id: i32) -> Result<Vec<Area>, AppError> {
        let node = AreaNode::new(self.by_code(cn_id).await?);
        Ok(node.children(&self.area_repo).await?.to_vec())
    }

    pub async fn chain(&self, cn_id: i32) -> Result<Vec<Area>, AppError> {
        let node = AreaNode::new(self.by_code(cn_id).await?);
        node.ancestor_chain(&self.area_repo).await
    }

    pub async fn address_of(&self, owner: AddressOwner, owner_id: i32) -> Result<FormattedAddress, AppError> {
        let address = self
            .address_repo
            .find(owner, owner_id)
            .await?
            .ok_or(AppError::NotFound("address"))?;
        format_address(&self.area_repo, &address).await
    }

    /// Active distributors of the city containing `cn_id`, with its cached count.
    pub async fn city_distributors(&self, cn_id: i32) -> Result<CityDistributors, AppError> {
        let node = AreaNode::new(self.by_code(cn_id).await?);
        let Some(city) = node.city(&self.area_repo).await?.cloned() else {
            return Err(AppError::invalid_field("cnId", "not_city", "Pick a city or a district."));
        };

        let city_node = AreaNode::new(city);
        let mut codes = vec![city_node.area.cn_id];
        codes.extend(city_node.children(&self.area_repo).await?.iter().map(|a| a.cn_id));

        let mut distributors = Vec::new();
        for distributor in self.distributor_repo.list_active_in(&codes).await? {
            let address = self.address_of(AddressOwner::Distributor, distributor.id).await?;
            distributors.push(DistributorProfile { distributor, address });
        }

        Ok(CityDistributors {
            city_cn_id: city_node.area.cn_id,
            city: city_node.area.name.clone(),
            distributor_amount: city_node.area.distributor_amount,
            distributors,
        })
    }

    /// Loads the seed file into an empty `areas` table. Returns the rows written.
    pub async fn seed_from_file(&self, path: &Path) -> anyhow::Result<u64> {
        if self.area_repo.count().await? > 0 {
            tracing::info!("areas already present, skipping seed");
            return Ok(0);
        }

        let raw = tokio::fs::read_to_string(path).await?;
        let seeds: Vec<AreaSeed> = serde_json::from_str(&raw)?;
        let areas: Vec<Area> = seeds.into_iter().map(Area::from).collect();
        validate_hierarchy(&areas)?;

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for chunk in areas.chunks(500) {
            written += self.area_repo.insert_many(&mut *tx, chunk).await?;
        }
        self.area_repo.sync_id_sequence(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!(rows = written, path = %path.display(), "area seed imported");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::area::NO_FATHER;
    use crate::testing::{FakeStore, area, seeded_areas};
    use chrono::Utc;

    const MUNICIPALITY_NAMES: [&str; 4] = ["北京市", "上海市", "天津市", "重庆市"];

    fn address(cn_id: i32, detail: &str) -> Address {
        Address {
            id: 1,
            owner_id: 1,
            cn_id,
            address: detail.to_owned(),
            longitude: None,
            latitude: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn municipality_name_is_elided() {
        let store = FakeStore::with_areas(seeded_areas());
        let node = AreaNode::new(store.area(3));
        assert_eq!(node.vague_address(&store).await.unwrap(), "北京东城区");
    }

    #[tokio::test]
    async fn chains_match_levels_and_fathers_sit_one_level_up() {
        let store = FakeStore::with_areas(seeded_areas());
        for area in seeded_areas() {
            let node = AreaNode::new(area.clone());
            let chain = node.ancestor_chain(&store).await.unwrap();
            assert_eq!(chain.len(), area.level as usize);
            assert_eq!(chain.last(), Some(&area));
            assert!(chain[0].is_root());

            match node.father(&store).await.unwrap() {
                Some(father) => assert_eq!(father.level, area.level - 1),
                None => assert!(area.is_root()),
            }

            let vague = node.vague_address(&store).await.unwrap();
            for name in MUNICIPALITY_NAMES {
                assert!(!vague.contains(name));
            }
        }
    }

    #[tokio::test]
    async fn precise_address_appends_the_detail() {
        let store = FakeStore::with_areas(seeded_areas());
        let formatted = format_address(&store, &address(440106, "天河路 385 号"))
            .await
            .unwrap();
        assert_eq!(formatted.vague, "广东省广州市天河区");
        assert_eq!(formatted.precise, format!("{}{}", formatted.vague, "天河路 385 号"));
    }

    #[tokio::test]
    async fn father_is_resolved_once_per_node() {
        let store = FakeStore::with_areas(seeded_areas());
        let mut node = AreaNode::new(store.area(3));

        node.father(&store).await.unwrap();
        node.father(&store).await.unwrap();
        assert_eq!(store.area_reads(), 1);

        node.invalidate();
        node.father(&store).await.unwrap();
        assert_eq!(store.area_reads(), 2);
    }

    #[tokio::test]
    async fn city_of_each_level() {
        let store = FakeStore::with_areas(seeded_areas());

        let district = AreaNode::new(store.area(12));
        assert_eq!(district.city(&store).await.unwrap().map(|a| a.id), Some(11));

        let city = AreaNode::new(store.area(11));
        assert_eq!(city.city(&store).await.unwrap().map(|a| a.id), Some(11));

        let province = AreaNode::new(store.area(10));
        assert!(province.city(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn districts_have_no_children() {
        let store = FakeStore::with_areas(seeded_areas());
        let beijing = AreaNode::new(store.area(2));
        let names: Vec<_> = beijing
            .children(&store)
            .await
            .unwrap()
            .iter()
            .map(|a| a.name.clone())
            .collect();
        assert_eq!(names, ["东城区", "西城区"]);

        let district = AreaNode::new(store.area(3));
        assert!(district.children(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_hierarchies_are_integrity_errors() {
        // Orphan.
        let store = FakeStore::with_areas(vec![area(3, 110101, "东城区", 99, DISTRICT)]);
        let err = AreaNode::new(store.area(3)).ancestor_chain(&store).await.unwrap_err();
        assert!(matches!(err, AppError::Integrity(IntegrityError::OrphanArea { .. })));

        // Two nodes pointing at each other.
        let store = FakeStore::with_areas(vec![
            area(5, 500100, "甲", 6, CITY),
            area(6, 500101, "乙", 5, DISTRICT),
        ]);
        let err = AreaNode::new(store.area(6)).ancestor_chain(&store).await.unwrap_err();
        assert!(err.is_integrity());

        // Root that is not a province.
        let store = FakeStore::with_areas(vec![area(7, 500200, "丙", 0, CITY)]);
        let err = AreaNode::new(store.area(7)).ancestor_chain(&store).await.unwrap_err();
        assert!(err.is_integrity());
    }

    #[tokio::test]
    async fn unknown_stored_codes_are_integrity_errors() {
        let store = FakeStore::with_areas(seeded_areas());
        let err = format_address(&store, &address(999999, "x")).await.unwrap_err();
        assert!(matches!(err, AppError::Integrity(IntegrityError::UnknownAreaCode { cn_id: 999999 })));
    }

    #[tokio::test]
    async fn only_leaves_are_accepted_as_addresses() {
        let store = FakeStore::with_areas(seeded_areas());
        assert_eq!(require_leaf(&store, 110101).await.unwrap().id, 3);
        assert!(matches!(
            require_leaf(&store, 110100).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            require_leaf(&store, 123456).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn childless_provinces_are_rejected_before_counting() {
        let store = FakeStore::with_areas(vec![area(30, 820000, "澳门特别行政区", NO_FATHER, PROVINCE)]);
        assert!(matches!(
            require_leaf(&store, 820000).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn distributor_amount_follows_inserts_and_revocations() {
        let store = FakeStore::with_areas(seeded_areas());
        store.add_distributor(1, 440106);
        store.add_distributor(2, 440305);
        assert_eq!(update_distributor_amount(&store, 440106).await.unwrap(), 1);

        store.add_distributor(3, 440100);
        assert_eq!(update_distributor_amount(&store, 440100).await.unwrap(), 2);
        assert_eq!(store.area(11).distributor_amount, 2);
        assert_eq!(store.area(13).distributor_amount, 0);

        store.revoke_distributor(3);
        update_distributor_amount(&store, 440106).await.unwrap();
        assert_eq!(store.area(11).distributor_amount, 1);
    }

    #[tokio::test]
    async fn moving_a_distributor_recounts_both_cities() {
        let store = FakeStore::with_areas(seeded_areas());
        store.add_distributor(1, 440106);
        update_distributor_amount(&store, 440106).await.unwrap();
        assert_eq!(store.area(11).distributor_amount, 1);

        store.move_distributor(1, 440305);
        update_distributor_amount(&store, 440106).await.unwrap();
        update_distributor_amount(&store, 440305).await.unwrap();
        assert_eq!(store.area(11).distributor_amount, 0);
        assert_eq!(store.area(13).distributor_amount, 1);
    }

    #[tokio::test]
    async fn provinces_have_no_city_to_count() {
        let store = FakeStore::with_areas(seeded_areas());
        let err = update_distributor_amount(&store, 440000).await.unwrap_err();
        assert!(matches!(err, AppError::Integrity(IntegrityError::NotCityScoped { .. })));
    }

    #[test]
    fn seed_validation_rejects_broken_rows() {
        assert!(validate_hierarchy(&seeded_areas()).is_ok());

        let mut rows = seeded_areas();
        rows.push(area(20, 440307, "龙岗区", 10, DISTRICT));
        assert!(matches!(
            validate_hierarchy(&rows),
            Err(IntegrityError::LevelMismatch { area_id: 20, .. })
        ));

        let mut rows = seeded_areas();
        rows.push(area(21, 440308, "盐田区", 77, DISTRICT));
        assert!(matches!(
            validate_hierarchy(&rows),
            Err(IntegrityError::OrphanArea { area_id: 21, .. })
        ));
    }

    #[test]
    fn seeding_flags_municipalities() {
        let seed: AreaSeed = serde_json::from_value(serde_json::json!({
            "id": 2, "cnId": 110100, "name": "北京市", "fatherId": 1, "level": 2
        }))
        .unwrap();
        assert!(Area::from(seed).is_direct_municipality);

        let seed: AreaSeed = serde_json::from_value(serde_json::json!({
            "id": 11, "cnId": 440100, "name": "广州市", "fatherId": 10, "level": 2
        }))
        .unwrap();
        assert!(!Area::from(seed).is_direct_municipality);
    }
}
