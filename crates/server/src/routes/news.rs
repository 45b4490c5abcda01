//! News feed.

use axum::extract::State;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mall_core::ArticleId;

use crate::db::articles::NewArticle;
use crate::db::{ArticleRepository, Page, PageRequest};
use crate::envelope::{ApiJson, ok};
use crate::error::{AppError, Result, missing};
use crate::extract::{Payload, lenient};
use crate::models::Article;
use crate::models::article::ArticleView;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;

/// `(category, title, summary, content, image, source)`.
const DEMO_ARTICLES: [(&str, &str, &str, &str, &str, &str); 6] = [
    (
        "INDUSTRY",
        "2025年智能穿戴设备市场规模突破5000亿",
        "据市场研究机构最新报告显示，2025年全球智能穿戴设备市场规模预计突破5000亿元，同比增长28%，健康监测和运动追踪类产品成为主要增长驱动力。",
        "随着老龄化社会的到来和全民健康意识的提升，智能穿戴设备正在从消费电子走向医疗健康领域……\n\n主要趋势包括：\n1. 血糖无创检测功能商业化落地\n2. 心电监测精度达到医疗级别\n3. 睡眠分析算法持续优化\n4. 国产品牌市场份额同比提升15个百分点\n\n分析师认为，未来3年，搭载AI健康管理功能的穿戴设备将成为市场主流，预计渗透率从18%增长至45%。",
        "https://picsum.photos/seed/article1/400/240",
        "行业观察",
    ),
    (
        "TECH",
        "HarmonyOS NEXT 操作系统深度解析",
        "华为HarmonyOS NEXT正式发布，全面采用自研内核，彻底与Android兼容层说再见，系统性能提升40%，流畅度大幅改善，开发者生态加速构建。",
        "HarmonyOS NEXT是华为自主研发的下一代操作系统，采用全新的微内核架构……\n\n核心技术亮点：\n\n▌微内核架构\n仅保留最精简的内核功能，大量系统服务运行在用户态，安全隔离级别显著提升。\n\n▌分布式软总线 2.0\n全新升级的跨设备通信框架，延迟降低60%。\n\n▌ArkTS语言体系\n基于TypeScript扩展的应用开发语言，提供严格的静态类型检查。\n\n▌自研图形栈\n全自研高性能渲染引擎，UI刷新延迟从16ms降低至8ms。",
        "https://picsum.photos/seed/article2/400/240",
        "技术前沿",
    ),
    (
        "INDUSTRY",
        "京东双11大屏电视品类销量增长分析",
        "京东今年双11大屏电视品类销售额同比增长35%，100英寸以上超大屏电视首次进入销量TOP10，Mini LED技术成为消费者选购核心考量因素。",
        "京东双11数据显示，2025年超大屏电视市场呈现爆发式增长……\n\n数据亮点：\n- 65英寸以上电视占总销量比例首次超过50%\n- 100英寸+超大屏销量同比增长320%\n- Mini LED背光方案渗透率达42%\n- 国产品牌占据前五名中的四席",
        "https://picsum.photos/seed/article3/400/240",
        "市场数据",
    ),
    (
        "TECH",
        "端侧大模型：AI手机的下一个赛点",
        "手机厂商纷纷布局端侧大模型，在不依赖云端的情况下实现AI推理，保护用户隐私的同时降低延迟，智能助手、拍照优化、实时翻译等场景迎来质的飞跃。",
        "端侧AI正在成为旗舰手机的标配功能……\n\n行业预测：2026年出货的旗舰手机将100%搭载本地AI大模型能力，中端机型渗透率也将超过65%。",
        "https://picsum.photos/seed/article4/400/240",
        "AI前沿",
    ),
    (
        "INDUSTRY",
        "新能源汽车智能座舱硬件升级趋势报告",
        "2025年新能源汽车智能座舱迎来硬件大升级，高通8295芯片成为旗舰标配，高清大屏、AR-HUD、全舱语音交互三大功能加速普及，用户体验显著改善。",
        "智能座舱正在成为消费者购车决策的重要因素……\n\n计算平台：\n高通骁龙8295成为旗舰座舱标配，算力达到30TOPS。\n\n显示系统：\n主驾15.6英寸以上曲面屏渗透率超过60%。\n\nAR-HUD：\n量产成本大幅下降，年销量突破200万套。",
        "https://picsum.photos/seed/article5/400/240",
        "行业报告",
    ),
    (
        "TECH",
        "国产芯片突破：龙芯3A6000台式机实测",
        "龙芯3A6000处理器综合性能达到Intel第十代酷睿同级水平，在办公、编程、轻度图形处理场景表现稳定，国产软硬件生态进一步完善，信创市场加速替代。",
        "龙芯3A6000是目前性能最强的国产桌面处理器……\n\n规格参数：\n- 制程：12nm LoongArch指令集\n- 核心数：4核心4线程\n- 主频：2.5GHz（睿频3.0GHz）\n- 三级缓存：16MB\n\n生态进展：\n- WPS、钉钉、腾讯会议均已原生适配\n- 主流Linux发行版完整支持",
        "https://picsum.photos/seed/article6/400/240",
        "深度评测",
    ),
];

fn demo_articles() -> Vec<NewArticle> {
    let base = Utc::now() - Duration::days(1);
    DEMO_ARTICLES
        .iter()
        .zip(0_i64..)
        .map(|(&(category, title, summary, content, image, source), i)| NewArticle {
            title: title.to_owned(),
            summary: Some(summary.to_owned()),
            content: Some(content.to_owned()),
            image_url: Some(image.to_owned()),
            category: Some(category.to_owned()),
            source: Some(source.to_owned()),
            view_count: 100 + (i * 137) % 900,
            published_at: Some(base - Duration::hours(i * 6)),
        })
        .collect()
}

/// Create the demo articles when the table is empty.
pub(crate) async fn ensure_demo_articles(repo: &ArticleRepository<'_>) -> Result<()> {
    if repo.count().await? == 0 {
        for article in demo_articles() {
            repo.create(&article).await?;
        }
        tracing::info!(count = DEMO_ARTICLES.len(), "Seeded demo articles");
    }
    Ok(())
}

/// Empty and `ALL` mean every category.
pub(crate) fn category_filter(category: Option<&str>) -> Option<&str> {
    category.filter(|c| !c.is_empty() && *c != "ALL")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub page: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub size: Option<i64>,
}

impl ListRequest {
    pub(crate) fn page_request(&self, default_size: i64) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(0), self.size.unwrap_or(default_size))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    pub list: Vec<ArticleView>,
    pub total_pages: i64,
    pub total_elements: i64,
    pub current_page: i64,
    pub has_more: bool,
}

impl From<Page<Article>> for ArticlePage {
    fn from(page: Page<Article>) -> Self {
        Self {
            total_pages: page.total_pages(),
            total_elements: page.total,
            current_page: page.request.page,
            has_more: page.has_more(),
            list: page.items.into_iter().map(ArticleView::summary).collect(),
        }
    }
}

/// Articles, most recently published first.
#[instrument(skip(state, body))]
pub async fn list(
    State(state): State<AppState>,
    Payload(body): Payload<ListRequest>,
) -> Result<ApiJson<ArticlePage>> {
    let repo = ArticleRepository::new(state.pool());
    ensure_demo_articles(&repo).await?;

    let page = repo
        .list(
            category_filter(body.category.as_deref()),
            body.page_request(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(ok(page.into()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetailRequest {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: Option<i64>,
}

/// One article with its body. Each call counts as a view.
#[instrument(skip(state, body), fields(id = ?body.id))]
pub async fn detail(
    State(state): State<AppState>,
    Payload(body): Payload<DetailRequest>,
) -> Result<ApiJson<ArticleView>> {
    let id = ArticleId::new(body.id.ok_or_else(|| missing("id"))?);
    let article = ArticleRepository::new(state.pool())
        .record_view(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_owned()))?;

    Ok(ok(ArticleView::detail(article)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_articles() {
        let articles = demo_articles();
        assert_eq!(articles.len(), 6);
        let views: Vec<i64> = articles.iter().map(|a| a.view_count).collect();
        assert_eq!(views, [100, 237, 374, 511, 648, 785]);
        assert!(articles[0].published_at > articles[5].published_at);
    }

    #[test]
    fn test_category_filter() {
        assert_eq!(category_filter(None), None);
        assert_eq!(category_filter(Some("")), None);
        assert_eq!(category_filter(Some("ALL")), None);
        assert_eq!(category_filter(Some("TECH")), Some("TECH"));
    }
}
