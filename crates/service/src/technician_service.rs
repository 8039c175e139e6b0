//! Public technician discovery and the technician's own profile management.

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::technician::{self, StringList, TechnicianProfile};
use models::user::{self, UserSummary};

use crate::errors::ServiceError;

/// Optional search criteria; all present criteria must match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub service: Option<String>,
    pub location: Option<String>,
    pub service_area: Option<String>,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `%needle%` with LIKE wildcards in the needle escaped, lowercased.
fn contains_pattern(needle: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') { escaped.push('\\'); }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('\\')
}

impl SearchFilter {
    /// Case-insensitive partial matching, combined with AND. Blank criteria are ignored.
    pub fn matches(&self, t: &technician::Model) -> bool {
        if let Some(service) = present(&self.service) {
            if !t.services_offered.any_contains_ci(service) { return false; }
        }
        if let Some(location) = present(&self.location) {
            if !t.location.to_lowercase().contains(&location.to_lowercase()) { return false; }
        }
        if let Some(area) = present(&self.service_area) {
            if !t.service_areas.any_contains_ci(area) { return false; }
        }
        true
    }
}

/// A list field as sent by clients: a JSON array or a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    Many(Vec<String>),
    Csv(String),
}

impl ListInput {
    /// Trim entries, drop empty ones and remove duplicates keeping first occurrence.
    pub fn normalize(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            ListInput::Many(v) => v,
            ListInput::Csv(s) => s.split(',').map(str::to_string).collect(),
        };
        let mut out: Vec<String> = Vec::with_capacity(raw.len());
        for item in raw {
            let item = item.trim();
            if !item.is_empty() && !out.iter().any(|o| o == item) {
                out.push(item.to_string());
            }
        }
        out
    }
}

/// Fields a technician may set on their own profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub services_offered: Option<ListInput>,
    pub specializations: Option<ListInput>,
    pub service_areas: Option<ListInput>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub availability: Option<ListInput>,
    pub is_available: Option<bool>,
}

fn with_owners(
    rows: Vec<(technician::Model, Option<user::Model>)>,
    include_role: bool,
) -> Vec<TechnicianProfile> {
    rows.into_iter()
        .map(|(t, u)| TechnicianProfile {
            technician: t,
            user: u.map(|u| {
                let summary = UserSummary::from(&u);
                if include_role { summary.with_role(u.role) } else { summary }
            }),
        })
        .collect()
}

/// Load a profile by id with its owner populated.
pub async fn load_profile(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<TechnicianProfile>, ServiceError> {
    let row = technician::Entity::find_by_id(id).find_also_related(user::Entity).one(db).await?;
    Ok(with_owners(row.into_iter().collect(), false).pop())
}

/// Verified technicians only.
#[instrument(skip(db))]
pub async fn list_verified(
    db: &DatabaseConnection,
) -> Result<Vec<TechnicianProfile>, ServiceError> {
    let rows = technician::Entity::find()
        .filter(technician::Column::IsVerifiedByAdmin.eq(true))
        .order_by_asc(technician::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    Ok(with_owners(rows, false))
}

/// Search among verified technicians. No match yields an empty list.
#[instrument(skip(db))]
pub async fn search(
    db: &DatabaseConnection,
    filter: &SearchFilter,
) -> Result<Vec<TechnicianProfile>, ServiceError> {
    let mut q = technician::Entity::find().filter(technician::Column::IsVerifiedByAdmin.eq(true));
    // list columns are JSON, so only the location narrows the query in SQL
    if let Some(location) = present(&filter.location) {
        let column = Func::lower(Expr::col((technician::Entity, technician::Column::Location)));
        q = q.filter(Expr::expr(column).like(contains_pattern(location)));
    }
    let rows = q
        .order_by_asc(technician::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    let rows = rows.into_iter().filter(|(t, _)| filter.matches(t)).collect();
    Ok(with_owners(rows, false))
}

/// Public single profile.
pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<TechnicianProfile, ServiceError> {
    load_profile(db, id).await?.ok_or_else(|| ServiceError::not_found("technician"))
}

/// Every technician, verified or not, owners with role (admin view).
pub async fn list_all(
    db: &DatabaseConnection,
    only_unverified: bool,
) -> Result<Vec<TechnicianProfile>, ServiceError> {
    let mut q = technician::Entity::find();
    if only_unverified {
        q = q.filter(technician::Column::IsVerifiedByAdmin.eq(false));
    }
    let rows = q
        .order_by_asc(technician::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    Ok(with_owners(rows, true))
}

/// The caller's own profile.
pub async fn get_own(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<TechnicianProfile, ServiceError> {
    let t = technician::find_by_user(db, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("technician profile"))?;
    get(db, t.id).await
}

/// Create or update the caller's profile. Returns the profile and whether it was created.
#[instrument(skip(db, update), fields(user_id = %user_id))]
pub async fn upsert_own(
    db: &DatabaseConnection,
    user_id: Uuid,
    update: ProfileUpdate,
) -> Result<(TechnicianProfile, bool), ServiceError> {
    let services = update.services_offered.map(ListInput::normalize);
    let specializations = update.specializations.map(ListInput::normalize);
    let areas = update.service_areas.map(ListInput::normalize);
    let availability = update.availability.map(ListInput::normalize);
    let contact = update.contact_number.map(|c| c.trim().to_string());
    let location = update.location.map(|l| l.trim().to_string());
    let description = update.description.map(|d| d.trim().to_string());

    if let Some(s) = &services { technician::validate_services(s)?; }
    if let Some(a) = &availability { technician::validate_availability(a)?; }
    if let Some(c) = &contact { technician::validate_contact_number(c)?; }
    if let Some(l) = &location { technician::validate_location(l)?; }
    if let Some(d) = &description { technician::validate_description(d)?; }

    let (saved, created) = match technician::find_by_user(db, user_id).await? {
        Some(existing) => {
            let mut am: technician::ActiveModel = existing.into();
            if let Some(s) = services { am.services_offered = Set(StringList(s)); }
            if let Some(s) = specializations { am.specializations = Set(StringList(s)); }
            if let Some(a) = areas { am.service_areas = Set(StringList(a)); }
            if let Some(a) = availability { am.availability = Set(StringList(a)); }
            if let Some(c) = contact { am.contact_number = Set(c); }
            if let Some(l) = location { am.location = Set(l); }
            if let Some(d) = description {
                am.description = Set(Some(d).filter(|d| !d.is_empty()));
            }
            if let Some(v) = update.is_available { am.is_available = Set(v); }
            (am.update(db).await?, false)
        }
        None => {
            let required = |field: &str| ServiceError::Validation(format!("{field} required"));
            let services = services.ok_or_else(|| required("servicesOffered"))?;
            let contact = contact.ok_or_else(|| required("contactNumber"))?;
            let location = location.ok_or_else(|| required("location"))?;
            let availability = availability
                .map(StringList)
                .unwrap_or_else(|| StringList::from(&technician::WEEKDAYS[..5]));
            let now = chrono::Utc::now().into();
            let am = technician::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                services_offered: Set(StringList(services)),
                specializations: Set(StringList(specializations.unwrap_or_default())),
                contact_number: Set(contact),
                location: Set(location),
                service_areas: Set(StringList(areas.unwrap_or_default())),
                description: Set(description.filter(|d| !d.is_empty())),
                average_rating: Set(0.0),
                review_count: Set(0),
                availability: Set(availability),
                is_available: Set(update.is_available.unwrap_or(true)),
                is_verified_by_admin: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
            };
            (am.insert(db).await?, true)
        }
    };
    info!(technician_id = %saved.id, created, "technician_profile_saved");
    Ok((get(db, saved.id).await?, created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, seed_technician, seed_user};
    use models::user::Role;

    #[test]
    fn list_input_normalisation() {
        let csv = ListInput::Csv(" Plumbing, ,Other,Plumbing ".into());
        assert_eq!(csv.normalize(), vec!["Plumbing".to_string(), "Other".to_string()]);
        let many = ListInput::Many(vec!["Giza".into(), "Giza".into(), " Cairo ".into()]);
        assert_eq!(many.normalize(), vec!["Giza".to_string(), "Cairo".to_string()]);
    }

    #[test]
    fn list_input_accepts_both_wire_shapes() {
        let u: ProfileUpdate = serde_json::from_value(serde_json::json!({
            "servicesOffered": ["Plumbing"],
            "serviceAreas": "Giza, Cairo"
        }))
        .unwrap();
        assert!(matches!(u.services_offered, Some(ListInput::Many(_))));
        assert!(matches!(u.service_areas, Some(ListInput::Csv(_))));
    }

    #[tokio::test]
    async fn unverified_are_hidden_from_public_listing() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let hidden = seed_technician(&db, "hidden@example.com", false).await;
        let shown = seed_technician(&db, "shown@example.com", true).await;

        let listed = list_verified(&db).await?;
        let ids: Vec<Uuid> = listed.into_iter().map(|p| p.technician.id).collect();
        assert_eq!(ids, vec![shown.id]);
        // single-profile lookup is not gated on verification
        assert_eq!(get(&db, hidden.id).await?.technician.id, hidden.id);
        assert!(matches!(get(&db, Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn search_combines_criteria_with_and() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let t = seed_technician(&db, "plumber@example.com", true).await;
        let mut am: technician::ActiveModel = t.clone().into();
        am.services_offered = Set(StringList(vec!["Plumbing".into()]));
        am.location = Set("Cairo".into());
        am.service_areas = Set(StringList(vec!["Nasr City".into(), "Heliopolis".into()]));
        am.update(&db).await?;

        let hit = SearchFilter {
            service: Some("plumb".into()),
            location: Some("CAIRO".into()),
            service_area: Some("helio".into()),
        };
        assert_eq!(search(&db, &hit).await?.len(), 1);

        let miss = SearchFilter {
            service: Some("plumb".into()),
            location: Some("Giza".into()),
            service_area: None,
        };
        assert!(search(&db, &miss).await?.is_empty());

        let blank = SearchFilter { service: Some("  ".into()), ..Default::default() };
        assert_eq!(search(&db, &blank).await?.len(), 1);

        let partial = SearchFilter { location: Some(" air".into()), ..Default::default() };
        assert_eq!(search(&db, &partial).await?.len(), 1);
        // wildcards in the query are matched literally
        for wild in ["%", "_air_", "C%o"] {
            let f = SearchFilter { location: Some(wild.into()), ..Default::default() };
            assert!(search(&db, &f).await?.is_empty(), "{wild}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let owner = seed_user(&db, "fresh@example.com", Role::Technician).await;

        let missing = upsert_own(&db, owner.id, ProfileUpdate::default()).await;
        assert!(matches!(missing, Err(ServiceError::Validation(_))));

        let create = ProfileUpdate {
            services_offered: Some(ListInput::Csv("Plumbing,Other".into())),
            contact_number: Some("+201234567890".into()),
            location: Some("Alexandria".into()),
            ..Default::default()
        };
        let (p, created) = upsert_own(&db, owner.id, create).await?;
        assert!(created);
        assert!(!p.technician.is_verified_by_admin);
        assert_eq!(p.user.as_ref().map(|u| u.id), Some(owner.id));

        let update = ProfileUpdate {
            description: Some("Fast and tidy".into()),
            availability: Some(ListInput::Many(vec!["Saturday".into()])),
            is_available: Some(false),
            ..Default::default()
        };
        let (p2, created) = upsert_own(&db, owner.id, update).await?;
        assert!(!created);
        assert_eq!(p2.technician.id, p.technician.id);
        assert_eq!(p2.technician.location, "Alexandria");
        assert_eq!(p2.technician.availability.0, vec!["Saturday".to_string()]);
        assert!(!p2.technician.is_available);

        let bad = ProfileUpdate {
            services_offered: Some(ListInput::Many(vec!["Gardening".into()])),
            ..Default::default()
        };
        assert!(matches!(upsert_own(&db, owner.id, bad).await, Err(ServiceError::Validation(_))));
        Ok(())
    }
}
