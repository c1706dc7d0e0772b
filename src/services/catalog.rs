use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        category, chapter, course, lesson, Category, Chapter, CoursePricing, Instructor, Lesson,
        PricingTier,
    },
    errors::ServiceError,
    services::pricing::PricingService,
};

const LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];
const DEFAULT_PAGE_SIZE: u64 = 10;

/// Public course catalog: filtered listing and course detail. Text and
/// level filters run in SQL; price filtering happens on the loaded set,
/// mirroring the tier-map shape the clients consume.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    pricing: Arc<PricingService>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, pricing: Arc<PricingService>) -> Self {
        Self { db, pricing }
    }

    #[instrument(skip(self))]
    pub async fn list_courses(
        &self,
        filters: CourseFilters,
    ) -> Result<CourseListResponse, ServiceError> {
        let page = filters.page.unwrap_or(1).max(1);
        let limit = filters.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);

        let mut query = course::Entity::find()
            .filter(course::Column::IsPublished.eq(true))
            .order_by_asc(course::Column::Title);

        if let Some(term) = filters.search.as_deref().filter(|t| !t.trim().is_empty()) {
            let term = term.trim();
            query = query.filter(
                Condition::any()
                    .add(course::Column::Title.contains(term))
                    .add(course::Column::Description.contains(term)),
            );
        }

        if let Some(level) = filters.level.as_deref() {
            query = query.filter(course::Column::Level.eq(level));
        }

        if let Some(name) = filters.category.as_deref() {
            let category = Category::find()
                .filter(category::Column::Name.eq(name))
                .one(&*self.db)
                .await?;
            match category {
                Some(cat) => query = query.filter(course::Column::CategoryId.eq(cat.id)),
                None => {
                    return Ok(CourseListResponse::empty(
                        page,
                        limit,
                        self.filter_options().await?,
                    ))
                }
            }
        }

        let courses = query.all(&*self.db).await?;
        let course_ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
        let pricing = self.pricing.for_courses(&course_ids).await?;
        let categories = self.categories_by_id().await?;
        let instructors = self.instructors_by_id(&courses).await?;

        let mut summaries: Vec<CourseSummary> = courses
            .into_iter()
            .map(|c| {
                let price_map = tier_price_map(pricing.get(&c.id).map(Vec::as_slice).unwrap_or(&[]));
                CourseSummary::from_model(c, &categories, &instructors, price_map)
            })
            .collect();

        summaries.retain(|c| {
            matches_price_filter(
                &c.pricing,
                filters.price_tier,
                filters.min_price,
                filters.max_price,
            )
        });

        let total_courses = summaries.len() as u64;
        let total_pages = total_courses.div_ceil(limit);
        let offset = ((page - 1) * limit) as usize;
        let paged: Vec<CourseSummary> = summaries
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Ok(CourseListResponse {
            courses: paged,
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_courses,
                has_next: page < total_pages,
                has_prev: page > 1 && total_pages > 0,
            },
            filters: self.filter_options().await?,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_course(&self, course_id: Uuid) -> Result<CourseDetail, ServiceError> {
        let course = course::Entity::find_by_id(course_id)
            .one(&*self.db)
            .await?
            .filter(|c| c.is_published)
            .ok_or(ServiceError::CourseNotFound)?;

        let categories = self.categories_by_id().await?;
        let instructors = self.instructors_by_id(std::slice::from_ref(&course)).await?;
        let pricing_rows = self.pricing.for_courses(&[course.id]).await?;
        let price_map = tier_price_map(
            pricing_rows
                .get(&course.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        );

        let chapters = Chapter::find()
            .filter(chapter::Column::CourseId.eq(course.id))
            .order_by_asc(chapter::Column::SortOrder)
            .all(&*self.db)
            .await?;

        let chapter_ids: Vec<Uuid> = chapters.iter().map(|ch| ch.id).collect();
        let mut lesson_counts: HashMap<Uuid, u64> = HashMap::new();
        if !chapter_ids.is_empty() {
            let lessons = Lesson::find()
                .filter(lesson::Column::ChapterId.is_in(chapter_ids))
                .all(&*self.db)
                .await?;
            for l in lessons {
                *lesson_counts.entry(l.chapter_id).or_insert(0) += 1;
            }
        }

        let chapter_views = chapters
            .into_iter()
            .map(|ch| ChapterView {
                id: ch.id,
                title: ch.title,
                description: ch.description,
                duration_minutes: ch.estimated_duration_minutes,
                lesson_count: lesson_counts.get(&ch.id).copied().unwrap_or(0),
                is_locked: ch.is_locked,
            })
            .collect();

        let language = course.language.clone();
        let is_certified = course.is_certified;
        let summary = CourseSummary::from_model(course, &categories, &instructors, price_map);

        Ok(CourseDetail {
            course: summary,
            language,
            is_certified,
            chapters: chapter_views,
        })
    }

    async fn filter_options(&self) -> Result<FilterOptions, ServiceError> {
        let categories = Category::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;

        let pricing = CoursePricing::find().all(&*self.db).await?;
        let min = pricing.iter().map(|p| p.price).min().unwrap_or(Decimal::ZERO);
        let max = pricing.iter().map(|p| p.price).max().unwrap_or(Decimal::ZERO);

        Ok(FilterOptions {
            categories: categories.into_iter().map(|c| c.name).collect(),
            levels: LEVELS.iter().map(|l| l.to_string()).collect(),
            price_range: PriceRange { min, max },
        })
    }

    async fn categories_by_id(&self) -> Result<HashMap<Uuid, String>, ServiceError> {
        let categories = Category::find().all(&*self.db).await?;
        Ok(categories.into_iter().map(|c| (c.id, c.name)).collect())
    }

    async fn instructors_by_id(
        &self,
        courses: &[course::Model],
    ) -> Result<HashMap<Uuid, InstructorView>, ServiceError> {
        let ids: Vec<Uuid> = courses.iter().map(|c| c.instructor_id).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let instructors = Instructor::find()
            .filter(crate::entities::instructor::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?;
        Ok(instructors
            .into_iter()
            .map(|i| {
                (
                    i.id,
                    InstructorView {
                        name: i.display_name,
                        title: i.title,
                        avatar: i.avatar_url,
                    },
                )
            })
            .collect())
    }
}

fn tier_price_map(rows: &[crate::entities::course_pricing::Model]) -> BTreeMap<String, TierPrice> {
    rows.iter()
        .map(|row| {
            (
                row.tier.as_str().to_string(),
                TierPrice {
                    price: row.price,
                    original_price: row.original_price,
                },
            )
        })
        .collect()
}

/// Whether a course's tier map satisfies the requested price constraints.
/// With no tier given, any tier inside the bounds qualifies the course.
pub fn matches_price_filter(
    pricing: &BTreeMap<String, TierPrice>,
    tier: Option<PricingTier>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
) -> bool {
    if tier.is_none() && min_price.is_none() && max_price.is_none() {
        return true;
    }

    let candidates: Vec<&TierPrice> = match tier {
        Some(t) => pricing.get(t.as_str()).into_iter().collect(),
        None => pricing.values().collect(),
    };

    candidates.iter().any(|p| {
        if let Some(min) = min_price {
            if p.price < min {
                return false;
            }
        }
        if let Some(max) = max_price {
            if p.price > max {
                return false;
            }
        }
        true
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilters {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    #[serde(rename = "priceTier")]
    pub price_tier: Option<PricingTier>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<Decimal>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TierPrice {
    pub price: Decimal,
    #[serde(rename = "originalPrice")]
    pub original_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InstructorView {
    pub name: String,
    pub title: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub level: String,
    pub duration_minutes: Option<i32>,
    pub instructor: Option<InstructorView>,
    pub pricing: BTreeMap<String, TierPrice>,
    pub rating: Decimal,
    pub student_count: i32,
    pub tags: Vec<String>,
}

impl CourseSummary {
    fn from_model(
        model: course::Model,
        categories: &HashMap<Uuid, String>,
        instructors: &HashMap<Uuid, InstructorView>,
        pricing: BTreeMap<String, TierPrice>,
    ) -> Self {
        let tags = model
            .tags
            .as_ref()
            .and_then(|t| serde_json::from_value::<Vec<String>>(t.clone()).ok())
            .unwrap_or_default();

        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            image: model.image_url,
            category: categories.get(&model.category_id).cloned(),
            level: model.level,
            duration_minutes: model.duration_minutes,
            instructor: instructors.get(&model.instructor_id).cloned(),
            pricing,
            rating: model.rating,
            student_count: model.student_count,
            tags,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_courses: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub levels: Vec<String>,
    pub price_range: PriceRange,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseListResponse {
    pub courses: Vec<CourseSummary>,
    pub pagination: Pagination,
    pub filters: FilterOptions,
}

impl CourseListResponse {
    fn empty(page: u64, _limit: u64, filters: FilterOptions) -> Self {
        Self {
            courses: vec![],
            pagination: Pagination {
                current_page: page,
                total_pages: 0,
                total_courses: 0,
                has_next: false,
                has_prev: false,
            },
            filters,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub lesson_count: u64,
    pub is_locked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseSummary,
    pub language: String,
    pub is_certified: bool,
    pub chapters: Vec<ChapterView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pricing_map() -> BTreeMap<String, TierPrice> {
        let mut map = BTreeMap::new();
        map.insert(
            "basic".to_string(),
            TierPrice {
                price: dec!(10.00),
                original_price: None,
            },
        );
        map.insert(
            "pro".to_string(),
            TierPrice {
                price: dec!(25.00),
                original_price: Some(dec!(40.00)),
            },
        );
        map
    }

    #[test]
    fn no_filter_matches_everything() {
        assert!(matches_price_filter(&pricing_map(), None, None, None));
        assert!(matches_price_filter(&BTreeMap::new(), None, None, None));
    }

    #[test]
    fn tier_filter_requires_tier_presence() {
        let map = pricing_map();
        assert!(matches_price_filter(&map, Some(PricingTier::Basic), None, None));
        assert!(!matches_price_filter(&map, Some(PricingTier::Premium), None, None));
    }

    #[test]
    fn price_bounds_apply_to_selected_tier() {
        let map = pricing_map();
        assert!(matches_price_filter(
            &map,
            Some(PricingTier::Pro),
            Some(dec!(20)),
            Some(dec!(30))
        ));
        assert!(!matches_price_filter(
            &map,
            Some(PricingTier::Basic),
            Some(dec!(20)),
            None
        ));
    }

    #[test]
    fn any_tier_in_bounds_qualifies() {
        let map = pricing_map();
        // basic (10) is below min, pro (25) is within
        assert!(matches_price_filter(&map, None, Some(dec!(20)), Some(dec!(30))));
        // nothing above 50
        assert!(!matches_price_filter(&map, None, Some(dec!(50)), None));
    }

    #[test]
    fn pagination_math() {
        let total: u64 = 23;
        let limit: u64 = 10;
        assert_eq!(total.div_ceil(limit), 3);
        assert_eq!(0u64.div_ceil(limit), 0);
    }
}
