//! Fixture import run at boot and from `mall-cli seed`.
//!
//! The fixture root mirrors the app's API paths (`home/queryHomePageInfo.json`
//! answers `POST /home/queryHomePageInfo`). Every file is recorded verbatim
//! for the mock fallback, then the files the real routes depend on are
//! imported into their tables. Each typed import only runs while its tables
//! are empty, so re-running the seeder is harmless.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use mall_core::GoodsStatus;

use crate::db::carts::NewCartItem;
use crate::db::categories::NewCategory;
use crate::db::content::{MenuTable, TabTable};
use crate::db::goods::{GoodsStats, NewGoods};
use crate::db::{
    ApiMockRepository, CartRepository, CategoryRepository, ContentRepository, GoodsRepository,
    RepositoryError, api_mocks, carts, categories, content, goods,
};
use crate::extract::{GUEST_USER, lenient};
use crate::models::cart::{ItemFlags, clamp_quantity};
use crate::models::catalog::ROOT_CATEGORY_CODE;
use crate::models::{Goods, MenuEntry};

/// Category code given to goods imported from the goods list fixture.
pub const DEFAULT_CATEGORY: &str = "DEFAULT";
/// Category code given to goods imported from the maybe-like fixture.
pub const RECOMMEND_CATEGORY: &str = "RECOMMEND";
/// Store name used when a fixture store has none.
pub const FALLBACK_STORE_NAME: &str = "官方自营";

/// Errors that abort a seeding run.
#[derive(Debug, Error)]
pub enum SeedError {
    /// A fixture file or directory could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A typed fixture is not the JSON shape it should be.
    #[error("invalid fixture {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Database write failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Opening or committing an import transaction failed.
    #[error("transaction error: {0}")]
    Transaction(#[from] sqlx::Error),
}

/// What a seeding run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Fixture files recorded for the mock fallback.
    pub mocks_recorded: usize,
    /// Fixture files skipped because they were unreadable or not JSON.
    pub mocks_skipped: usize,
    /// Typed imports that wrote rows, by fixture path.
    pub imported: Vec<&'static str>,
    /// Goods rows that received synthetic statistics.
    pub backfilled: usize,
}

// =============================================================================
// Fixture shapes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BannerFixture {
    #[serde(deserialize_with = "lenient::string")]
    img_url: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MenuFixture {
    #[serde(deserialize_with = "lenient::string")]
    menu_icon: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    menu_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    menu_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    h5url: Option<String>,
}

impl From<MenuFixture> for MenuEntry {
    fn from(fixture: MenuFixture) -> Self {
        Self {
            id: 0,
            menu_icon: fixture.menu_icon,
            menu_name: fixture.menu_name,
            menu_code: fixture.menu_code,
            h5url: fixture.h5url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TabFixture {
    #[serde(deserialize_with = "lenient::string")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CategoryFixture {
    #[serde(deserialize_with = "lenient::string")]
    code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SubCategoryFixture {
    #[serde(deserialize_with = "lenient::string")]
    category_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    category_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    icon_url: Option<String>,
    cate_list: Vec<SubCategoryFixture>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoodsFixture {
    #[serde(deserialize_with = "lenient::string")]
    img_url: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    tag: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    des1: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    des2: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    kind: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    price: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    h5url: Option<String>,
}

impl GoodsFixture {
    fn into_new_goods(self, category: &str) -> NewGoods {
        NewGoods {
            category_code: Some(category.to_owned()),
            img_url: self.img_url,
            description: self.description,
            tag: self.tag,
            des1: self.des1,
            des2: self.des2,
            kind: self.kind,
            price: self.price,
            h5url: self.h5url,
            status: GoodsStatus::Active,
            ..NewGoods::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoreFixture {
    #[serde(deserialize_with = "lenient::string")]
    store_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    store_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    h5url: Option<String>,
    goods_list: Vec<CartGoodsFixture>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CartGoodsFixture {
    #[serde(deserialize_with = "lenient::string")]
    code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    img_url: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    price: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    color: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    size: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    num: Option<i64>,
    #[serde(deserialize_with = "lenient::bool")]
    select: Option<bool>,
}

// =============================================================================
// Seeder
// =============================================================================

/// Imports a fixture tree into the database.
pub struct Seeder<'a> {
    pool: &'a SqlitePool,
    root: PathBuf,
}

impl<'a> Seeder<'a> {
    /// Create a seeder reading fixtures below `root`.
    #[must_use]
    pub fn new(pool: &'a SqlitePool, root: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            root: root.into(),
        }
    }

    /// Run every import step followed by the statistics backfill.
    ///
    /// A missing root is not an error; nothing is imported.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` if a typed fixture cannot be read or parsed, or a
    /// database write fails. Unreadable files in the bulk mock import are
    /// skipped instead.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn run(&self) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();

        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            info!("Fixture directory not found, skipping seed");
            return Ok(report);
        }

        if ApiMockRepository::new(self.pool).count().await? == 0 {
            self.import_mocks(&mut report).await?;
        }

        let steps = [
            ("home/queryHomePageInfo.json", self.import_home().await?),
            ("category/list.json", self.import_categories().await?),
            (
                "category/queryContentByCategory.json",
                self.import_sub_categories().await?,
            ),
            ("common/queryGoodsListByPage.json", self.import_goods().await?),
            ("mine/queryMineInfo.json", self.import_mine().await?),
            ("cart/queryCartGoodsList.json", self.import_cart().await?),
            ("cart/queryMaybeLikeList.json", self.import_maybe_like().await?),
        ];
        report.imported = steps
            .into_iter()
            .filter_map(|(name, imported)| imported.then_some(name))
            .collect();

        report.backfilled = backfill(self.pool).await?;

        info!(
            mocks_recorded = report.mocks_recorded,
            mocks_skipped = report.mocks_skipped,
            imported = ?report.imported,
            backfilled = report.backfilled,
            "Seeding complete"
        );
        Ok(report)
    }

    /// Record every `*.json` file as a `POST` mock keyed by its API path.
    async fn import_mocks(&self, report: &mut SeedReport) -> Result<(), SeedError> {
        let mut files = json_files(&self.root).await?;
        files.sort();

        let mut recordings = Vec::with_capacity(files.len());
        for file in files {
            let Some(path) = api_path(&self.root, &file) else {
                continue;
            };
            let body = match tokio::fs::read_to_string(&file).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "Skipping unreadable fixture");
                    report.mocks_skipped += 1;
                    continue;
                }
            };
            if let Err(e) = serde_json::from_str::<Value>(&body) {
                warn!(file = %file.display(), error = %e, "Skipping fixture that is not JSON");
                report.mocks_skipped += 1;
                continue;
            }
            recordings.push((path, body));
        }

        let mut tx = self.pool.begin().await?;
        let mut recorded = 0;
        for (path, body) in &recordings {
            if api_mocks::insert_in(&mut tx, path, "POST", body).await? {
                recorded += 1;
            }
        }
        tx.commit().await?;

        report.mocks_recorded = recorded;
        debug!(recorded, "Recorded mock responses");
        Ok(())
    }

    async fn import_home(&self) -> Result<bool, SeedError> {
        if ContentRepository::new(self.pool).has_home_content().await? {
            return Ok(false);
        }
        let rel = "home/queryHomePageInfo.json";
        let Some(root) = self.read_fixture(rel).await? else {
            return Ok(false);
        };
        let banners = self.list_at::<BannerFixture>(&root, "/data/bannerList", rel)?;
        let menus = self.list_at::<MenuFixture>(&root, "/data/nineMenuList", rel)?;
        let tabs = self.list_at::<TabFixture>(&root, "/data/tabList", rel)?;

        let mut tx = self.pool.begin().await?;
        for banner in banners {
            content::add_banner_in(&mut tx, banner.img_url.as_deref(), banner.kind.as_deref())
                .await?;
        }
        for menu in menus {
            content::add_menu_in(&mut tx, MenuTable::HomeNineMenu, &menu.into()).await?;
        }
        for tab in tabs {
            content::add_tab_in(&mut tx, TabTable::Home, tab.name.as_deref(), tab.code.as_deref())
                .await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn import_categories(&self) -> Result<bool, SeedError> {
        if CategoryRepository::new(self.pool).count(None).await? > 0 {
            return Ok(false);
        }
        let rel = "category/list.json";
        let Some(root) = self.read_fixture(rel).await? else {
            return Ok(false);
        };
        let fixtures = self.list_at::<CategoryFixture>(&root, "/data/categoryList", rel)?;

        let mut tx = self.pool.begin().await?;
        for category in &fixtures {
            let Some(code) = category.code.as_deref() else {
                continue;
            };
            let row = NewCategory {
                code,
                name: category.name.as_deref().unwrap_or(code),
                level: 1,
                ..NewCategory::default()
            };
            categories::insert_in(&mut tx, &row).await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    /// Second and third levels hang under the root category.
    async fn import_sub_categories(&self) -> Result<bool, SeedError> {
        if CategoryRepository::new(self.pool).count(Some(2)).await? > 0 {
            return Ok(false);
        }
        let rel = "category/queryContentByCategory.json";
        let Some(root) = self.read_fixture(rel).await? else {
            return Ok(false);
        };
        let seconds = self.list_at::<SubCategoryFixture>(&root, "/data/secondCateList", rel)?;

        let mut tx = self.pool.begin().await?;
        if let Some(banner) = root.pointer("/data/bannerUrl").and_then(Value::as_str) {
            categories::set_banner_in(&mut tx, ROOT_CATEGORY_CODE, banner).await?;
        }

        for second in &seconds {
            let Some(code) = second.category_code.as_deref() else {
                continue;
            };
            let row = NewCategory {
                code,
                name: second.category_name.as_deref().unwrap_or(code),
                parent_code: Some(ROOT_CATEGORY_CODE),
                level: 2,
                icon_url: second.icon_url.as_deref(),
                banner_url: None,
            };
            categories::insert_in(&mut tx, &row).await?;

            for leaf in &second.cate_list {
                let Some(leaf_code) = leaf.category_code.as_deref() else {
                    continue;
                };
                let row = NewCategory {
                    code: leaf_code,
                    name: leaf.category_name.as_deref().unwrap_or(leaf_code),
                    parent_code: Some(code),
                    level: 3,
                    icon_url: leaf.icon_url.as_deref(),
                    banner_url: None,
                };
                categories::insert_in(&mut tx, &row).await?;
            }
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn import_goods(&self) -> Result<bool, SeedError> {
        if GoodsRepository::new(self.pool).count(None).await? > 0 {
            return Ok(false);
        }
        let rel = "common/queryGoodsListByPage.json";
        let Some(root) = self.read_fixture(rel).await? else {
            return Ok(false);
        };
        let fixtures = self.list_at::<GoodsFixture>(&root, "/data/goodsList", rel)?;

        let mut tx = self.pool.begin().await?;
        for fixture in fixtures {
            let mut row = fixture.into_new_goods(DEFAULT_CATEGORY);
            row.recommend = Some(false);
            row.stats = Some(GoodsStats {
                recommend: false,
                ..draw_stats()
            });
            goods::create_in(&mut tx, &row).await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn import_mine(&self) -> Result<bool, SeedError> {
        if ContentRepository::new(self.pool).has_mine_content().await? {
            return Ok(false);
        }
        let rel = "mine/queryMineInfo.json";
        let Some(root) = self.read_fixture(rel).await? else {
            return Ok(false);
        };
        let menus = self.list_at::<MenuFixture>(&root, "/data/functionList", rel)?;
        let tabs = self.list_at::<TabFixture>(&root, "/data/tabList", rel)?;

        let mut tx = self.pool.begin().await?;
        for menu in menus {
            content::add_menu_in(&mut tx, MenuTable::MineFunction, &menu.into()).await?;
        }
        for tab in tabs {
            content::add_tab_in(&mut tx, TabTable::Mine, tab.name.as_deref(), tab.code.as_deref())
                .await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    /// Fixture cart lines land in the guest cart.
    async fn import_cart(&self) -> Result<bool, SeedError> {
        let repo = CartRepository::new(self.pool);
        if repo.count_stores().await? > 0 || repo.count_items().await? > 0 {
            return Ok(false);
        }
        let rel = "cart/queryCartGoodsList.json";
        let Some(root) = self.read_fixture(rel).await? else {
            return Ok(false);
        };
        let stores = self.list_at::<StoreFixture>(&root, "/data", rel)?;
        if stores.is_empty() {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;
        let cart = carts::get_or_create_cart_in(&mut tx, GUEST_USER).await?;
        for (index, fixture) in stores.into_iter().enumerate() {
            let code = fixture
                .store_code
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| format!("store{}", index + 1));
            let name = fixture
                .store_name
                .unwrap_or_else(|| FALLBACK_STORE_NAME.to_owned());
            let store =
                carts::get_or_create_store_in(&mut tx, &code, &name, fixture.h5url.as_deref())
                    .await?;

            for line in fixture.goods_list {
                let item = NewCartItem {
                    store_id: store.id,
                    code: line.code.unwrap_or_default(),
                    img_url: line.img_url,
                    description: line.description,
                    price: line.price,
                    color: line.color.unwrap_or_else(|| "default".to_owned()),
                    size: line.size.unwrap_or_else(|| "default".to_owned()),
                    num: clamp_quantity(line.num.unwrap_or(1)),
                    flags: ItemFlags {
                        selected: line.select.unwrap_or(true),
                        ..ItemFlags::default()
                    },
                };
                carts::add_item_in(&mut tx, cart.id, &item).await?;
            }
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn import_maybe_like(&self) -> Result<bool, SeedError> {
        if GoodsRepository::new(self.pool)
            .exists_in_category(RECOMMEND_CATEGORY)
            .await?
        {
            return Ok(false);
        }
        let rel = "cart/queryMaybeLikeList.json";
        let Some(root) = self.read_fixture(rel).await? else {
            return Ok(false);
        };
        let fixtures = self.list_at::<GoodsFixture>(&root, "/data", rel)?;

        let mut tx = self.pool.begin().await?;
        for fixture in fixtures {
            let mut row = fixture.into_new_goods(RECOMMEND_CATEGORY);
            row.recommend = Some(true);
            goods::create_in(&mut tx, &row).await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    /// Read and parse a fixture, or `None` if the file does not exist.
    async fn read_fixture(&self, rel: &str) -> Result<Option<Value>, SeedError> {
        let path = self.root.join(rel);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(fixture = rel, "Fixture missing, skipping import");
                return Ok(None);
            }
            Err(source) => return Err(SeedError::Io { path, source }),
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| SeedError::Json { path, source })
    }

    /// Deserialize the array at `pointer`. Anything that is not an array
    /// yields no rows.
    fn list_at<T: DeserializeOwned>(
        &self,
        root: &Value,
        pointer: &str,
        rel: &str,
    ) -> Result<Vec<T>, SeedError> {
        match root.pointer(pointer) {
            Some(list @ Value::Array(_)) => {
                serde_json::from_value(list.clone()).map_err(|source| SeedError::Json {
                    path: self.root.join(rel),
                    source,
                })
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// Every `*.json` file below `root`.
async fn json_files(root: &Path) -> Result<Vec<PathBuf>, SeedError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| SeedError::Io {
                path: dir.clone(),
                source,
            })?;
        while let Some(entry) = entries.next_entry().await.map_err(|source| SeedError::Io {
            path: dir.clone(),
            source,
        })? {
            let path = entry.path();
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file()
                && path.extension().is_some_and(|ext| ext == "json")
            {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// `root/cart/queryCartGoodsList.json` becomes `/cart/queryCartGoodsList`.
fn api_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(format!("/{}", segments.join("/")))
}

// =============================================================================
// Statistics backfill
// =============================================================================

/// Draw synthetic goods statistics.
///
/// Sales in `[100, 5099]`, rating in `[3.5, 5.0)`, views in `[500, 20499]`,
/// listed within the last 90 days, recommended one time in five.
#[must_use]
pub fn draw_stats() -> GoodsStats {
    let mut rng = rand::rng();
    GoodsStats {
        sales_count: rng.random_range(100..5100),
        rating: 3.5 + rng.random::<f64>() * 1.5,
        view_count: rng.random_range(500..20_500),
        created_at: Utc::now() - Duration::days(rng.random_range(0..90)),
        recommend: rng.random_bool(0.2),
    }
}

/// Fill the missing statistics of `goods`. Returns whether anything changed.
fn fill_missing_stats(goods: &mut Goods) -> bool {
    let drawn = draw_stats();
    let mut changed = false;
    if goods.sales_count.is_none() {
        goods.sales_count = Some(drawn.sales_count);
        changed = true;
    }
    if goods.rating.is_none() {
        goods.rating = Some(drawn.rating);
        changed = true;
    }
    if goods.view_count.is_none() {
        goods.view_count = Some(drawn.view_count);
        changed = true;
    }
    if goods.created_at.is_none() {
        goods.created_at = Some(drawn.created_at);
        changed = true;
    }
    if goods.recommend.is_none() {
        goods.recommend = Some(drawn.recommend);
        changed = true;
    }
    changed
}

/// Give every goods row with a missing statistic a synthetic value.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
#[instrument(skip(pool))]
pub async fn backfill(pool: &SqlitePool) -> Result<usize, RepositoryError> {
    let repo = GoodsRepository::new(pool);
    let mut updated = 0;
    for mut goods in repo.list_missing_stats().await? {
        if fill_missing_stats(&mut goods) {
            repo.update_stats(&goods).await?;
            updated += 1;
        }
    }
    if updated > 0 {
        info!(updated, "Backfilled goods statistics");
    }
    Ok(updated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::db::goods::GoodsFilter;
    use crate::db::{PageRequest, tests::test_pool};

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn fixture_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "home/queryHomePageInfo.json",
            r#"{"code":"200","data":{
                "adUrl":"https://img.example/ad.png",
                "bannerList":[{"imgUrl":"b1.png","type":"1"},{"imgUrl":"b2.png","type":2}],
                "nineMenuList":[{"menuIcon":"i.png","menuName":"超市","menuCode":"01","h5url":"h"}],
                "tabList":[{"name":"精选","code":"A"}]}}"#,
        );
        write(
            root,
            "category/list.json",
            r#"{"data":{"categoryList":[{"code":"000","name":"推荐"},{"code":"001","name":"手机"}]}}"#,
        );
        write(
            root,
            "category/queryContentByCategory.json",
            r#"{"data":{"bannerUrl":"banner.png","secondCateList":[
                {"categoryName":"热门","categoryCode":"0001","cateList":[
                    {"iconUrl":"x.png","categoryName":"iPhone","categoryCode":"00011"}]}]}}"#,
        );
        write(
            root,
            "common/queryGoodsListByPage.json",
            r#"{"data":{"goodsList":[
                {"imgUrl":"g1.png","description":"phone","price":"1999.00","type":"2"},
                {"imgUrl":"g2.png","description":"case","price":19.9}]}}"#,
        );
        write(
            root,
            "mine/queryMineInfo.json",
            r#"{"data":{"functionList":[{"menuName":"订单"}],"tabList":[{"name":"收藏","code":"fav"}]}}"#,
        );
        write(
            root,
            "cart/queryCartGoodsList.json",
            r#"{"data":[{"storeName":"京东自营","storeCode":"jd","goodsList":[
                {"code":"1","description":"phone","price":"1999.00","color":"black","size":"128G","num":2},
                {"code":"2","description":"case","price":"19.90","select":false}]}]}"#,
        );
        write(
            root,
            "cart/queryMaybeLikeList.json",
            r#"{"data":[{"imgUrl":"m.png","description":"maybe","price":"9.90","type":"1"}]}"#,
        );
        write(root, "broken/bad.json", "{ not json");
        dir
    }

    #[test]
    fn test_api_path() {
        let root = Path::new("/fixtures");
        assert_eq!(
            api_path(root, Path::new("/fixtures/cart/queryCartGoodsList.json")).as_deref(),
            Some("/cart/queryCartGoodsList")
        );
        assert_eq!(api_path(root, Path::new("/elsewhere/x.json")), None);
    }

    #[test]
    fn test_draw_stats_ranges() {
        for _ in 0..200 {
            let stats = draw_stats();
            assert!((100..5100).contains(&stats.sales_count));
            assert!((3.5..5.0).contains(&stats.rating));
            assert!((500..20_500).contains(&stats.view_count));
            assert!(stats.created_at <= Utc::now());
            assert!(stats.created_at > Utc::now() - Duration::days(91));
        }
    }

    #[tokio::test]
    async fn test_missing_root_is_noop() {
        let pool = test_pool().await;
        let report = Seeder::new(&pool, "/definitely/not/here")
            .run()
            .await
            .unwrap();
        assert_eq!(report, SeedReport::default());
    }

    #[tokio::test]
    async fn test_full_import() {
        let pool = test_pool().await;
        let dir = fixture_tree();
        let report = Seeder::new(&pool, dir.path()).run().await.unwrap();

        assert_eq!(report.mocks_recorded, 7);
        assert_eq!(report.mocks_skipped, 1);
        assert_eq!(report.imported.len(), 7);
        assert_eq!(report.backfilled, 1, "only the maybe-like row lacks stats");

        let mocks = ApiMockRepository::new(&pool);
        let home = mocks
            .find("/home/queryHomePageInfo", "POST")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            home.data_field("adUrl").as_deref(),
            Some("https://img.example/ad.png")
        );
        assert!(mocks.find("/broken/bad", "POST").await.unwrap().is_none());

        let content = ContentRepository::new(&pool);
        let banners = content.banners().await.unwrap();
        assert_eq!(banners.len(), 2);
        assert_eq!(banners[1].kind.as_deref(), Some("2"));
        assert_eq!(content.menus(MenuTable::MineFunction).await.unwrap().len(), 1);

        let categories = CategoryRepository::new(&pool);
        assert_eq!(categories.count(Some(1)).await.unwrap(), 2);
        let root = categories.get_by_code("000").await.unwrap().unwrap();
        assert_eq!(root.banner_url.as_deref(), Some("banner.png"));
        assert_eq!(categories.children("000").await.unwrap()[0].code, "0001");
        assert_eq!(categories.children("0001").await.unwrap()[0].code, "00011");

        let goods = GoodsRepository::new(&pool);
        let all = goods
            .list(&GoodsFilter::default(), Default::default(), PageRequest::new(0, 50))
            .await
            .unwrap();
        assert_eq!(all.total, 3);
        assert!(all.items.iter().all(|g| g.sales_count.is_some() && g.rating.is_some()));
        let defaults: Vec<_> = all
            .items
            .iter()
            .filter(|g| g.category_code.as_deref() == Some(DEFAULT_CATEGORY))
            .collect();
        assert_eq!(defaults.len(), 2);
        assert!(defaults.iter().all(|g| g.recommend == Some(false)));
        assert!(defaults.iter().any(|g| g.price.as_deref() == Some("19.9")));

        let carts = CartRepository::new(&pool);
        let cart = carts.find_cart(GUEST_USER).await.unwrap().unwrap();
        let items = carts.list_items(cart.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].num, 2);
        assert!(items[0].selected);
        assert_eq!(items[1].num, 1);
        assert!(!items[1].selected);
        assert_eq!(items[1].color, "default");
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let pool = test_pool().await;
        let dir = fixture_tree();
        Seeder::new(&pool, dir.path()).run().await.unwrap();
        let second = Seeder::new(&pool, dir.path()).run().await.unwrap();

        assert_eq!(second.mocks_recorded, 0);
        assert!(second.imported.is_empty());
        assert_eq!(second.backfilled, 0);
        assert_eq!(GoodsRepository::new(&pool).count(None).await.unwrap(), 3);
        assert_eq!(CartRepository::new(&pool).count_items().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_malformed_typed_fixture_aborts() {
        let pool = test_pool().await;
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "category/list.json",
            r#"{"data":{"categoryList":"not a list"}}"#,
        );
        write(dir.path(), "mine/queryMineInfo.json", "{ broken");

        let err = Seeder::new(&pool, dir.path()).run().await.unwrap_err();
        assert!(matches!(err, SeedError::Json { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_failed_import_is_retried_after_fix() {
        let pool = test_pool().await;
        let dir = TempDir::new().unwrap();
        let rel = "home/queryHomePageInfo.json";
        write(
            dir.path(),
            rel,
            r#"{"data":{"bannerList":[{"imgUrl":"b1.png"}],"nineMenuList":[1,2]}}"#,
        );

        let err = Seeder::new(&pool, dir.path()).run().await.unwrap_err();
        assert!(matches!(err, SeedError::Json { .. }), "{err}");
        let content = ContentRepository::new(&pool);
        assert!(content.banners().await.unwrap().is_empty());
        assert!(!content.has_home_content().await.unwrap());

        write(
            dir.path(),
            rel,
            r#"{"data":{"bannerList":[{"imgUrl":"b1.png"}],
                "nineMenuList":[{"menuName":"超市","menuCode":"01"}]}}"#,
        );
        let report = Seeder::new(&pool, dir.path()).run().await.unwrap();
        assert!(report.imported.contains(&rel));
        assert_eq!(content.banners().await.unwrap().len(), 1);
        let menus = content.menus(MenuTable::HomeNineMenu).await.unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].menu_code.as_deref(), Some("01"));
    }
}
