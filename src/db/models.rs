/**
 * Database Models
 * Rows as stored, plus the create/patch payloads accepted by the API
 */
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

// ============================================================================
// Serde helpers
// ============================================================================

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in patch payloads.
fn explicit<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Time of day as `HH:MM` or `HH:MM:SS`.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid time of day '{}'", raw)))
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize(deserializer).map(Some)
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct AdminCredential {
    pub id: i64,
    pub username: String,
    pub hashed_password: String,
}

// ============================================================================
// Home content
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct HomeContent {
    pub id: i64,
    pub hero_text: Option<String>,
    pub hero_image_url: Option<String>,
    pub wedding_date: Option<NaiveDate>,
    pub subtitle: Option<String>,
    pub text_color: Option<String>,
    pub navbar_color: Option<String>,
    pub navbar_text_color: Option<String>,
    pub accent_color: Option<String>,
    pub body_bg_color: Option<String>,
    pub body_heading_color: Option<String>,
    pub body_text_color: Option<String>,
    pub footer_bg_color: Option<String>,
    pub footer_text_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HomeContentPatch {
    #[serde(default, deserialize_with = "explicit")]
    pub hero_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub hero_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub wedding_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "explicit")]
    pub subtitle: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub text_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub navbar_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub navbar_text_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub accent_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub body_bg_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub body_heading_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub body_text_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub footer_bg_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub footer_text_color: Option<Option<String>>,
}

impl HomeContentPatch {
    pub fn apply(self, home: &mut HomeContent) {
        set(&mut home.hero_text, self.hero_text);
        set(&mut home.hero_image_url, self.hero_image_url);
        set(&mut home.wedding_date, self.wedding_date);
        set(&mut home.subtitle, self.subtitle);
        set(&mut home.text_color, self.text_color);
        set(&mut home.navbar_color, self.navbar_color);
        set(&mut home.navbar_text_color, self.navbar_text_color);
        set(&mut home.accent_color, self.accent_color);
        set(&mut home.body_bg_color, self.body_bg_color);
        set(&mut home.body_heading_color, self.body_heading_color);
        set(&mut home.body_text_color, self.body_text_color);
        set(&mut home.footer_bg_color, self.footer_bg_color);
        set(&mut home.footer_text_color, self.footer_text_color);
    }
}

// ============================================================================
// Story
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StorySection {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "order")]
    pub sort_order: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewStorySection {
    pub title: String,
    pub content: String,
    pub order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorySectionPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<i64>,
}

impl StorySectionPatch {
    pub fn apply(self, section: &mut StorySection) {
        set(&mut section.title, self.title);
        set(&mut section.content, self.content);
        set(&mut section.sort_order, self.order);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoryImage {
    pub id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i64,
    pub section_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewStoryImage {
    pub image_url: String,
    pub caption: Option<String>,
    pub section_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoryImagePatch {
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub caption: Option<Option<String>>,
    pub order: Option<i64>,
    #[serde(default, deserialize_with = "explicit")]
    pub section_id: Option<Option<i64>>,
}

impl StoryImagePatch {
    pub fn apply(self, image: &mut StoryImage) {
        set(&mut image.image_url, self.image_url);
        set(&mut image.caption, self.caption);
        set(&mut image.sort_order, self.order);
        set(&mut image.section_id, self.section_id);
    }
}

// ============================================================================
// Wedding info
// ============================================================================

/// Info section as exposed by the API. The gallery is a real list here;
/// its text encoding at rest stays inside `db::info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeddingInfoSection {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub section_type: String,
    pub map_embed_url: Option<String>,
    pub image_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub additional_info: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewInfoSection {
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub section_type: String,
    pub map_embed_url: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery_urls: Vec<String>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InfoSectionPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub icon: Option<Option<String>>,
    pub section_type: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub map_embed_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub image_url: Option<Option<String>>,
    /// `null` clears the gallery, same as an empty list.
    #[serde(default, deserialize_with = "explicit")]
    pub gallery_urls: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "explicit")]
    pub additional_info: Option<Option<String>>,
    pub sort_order: Option<i64>,
}

impl InfoSectionPatch {
    pub fn apply(self, section: &mut WeddingInfoSection) {
        set(&mut section.title, self.title);
        set(&mut section.description, self.description);
        set(&mut section.icon, self.icon);
        set(&mut section.section_type, self.section_type);
        set(&mut section.map_embed_url, self.map_embed_url);
        set(&mut section.image_url, self.image_url);
        set(
            &mut section.gallery_urls,
            self.gallery_urls.map(Option::unwrap_or_default),
        );
        set(&mut section.additional_info, self.additional_info);
        set(&mut section.sort_order, self.sort_order);
    }
}

// ============================================================================
// Timeline
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimelineEvent {
    pub id: i64,
    pub time: NaiveTime,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i64,
    pub image_url: Option<String>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTimelineEvent {
    #[serde(deserialize_with = "time_of_day::deserialize")]
    pub time: NaiveTime,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineEventPatch {
    #[serde(default, deserialize_with = "time_of_day::deserialize_opt")]
    pub time: Option<NaiveTime>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub icon: Option<Option<String>>,
    pub order: Option<i64>,
    #[serde(default, deserialize_with = "explicit")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub additional_info: Option<Option<String>>,
}

impl TimelineEventPatch {
    pub fn apply(self, event: &mut TimelineEvent) {
        set(&mut event.time, self.time);
        set(&mut event.title, self.title);
        set(&mut event.description, self.description);
        set(&mut event.icon, self.icon);
        set(&mut event.sort_order, self.order);
        set(&mut event.image_url, self.image_url);
        set(&mut event.additional_info, self.additional_info);
    }
}

// ============================================================================
// Gallery
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GalleryImage {
    pub id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewGalleryImage {
    pub image_url: String,
    pub caption: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GalleryImagePatch {
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub caption: Option<Option<String>>,
    pub order: Option<i64>,
}

impl GalleryImagePatch {
    pub fn apply(self, image: &mut GalleryImage) {
        set(&mut image.image_url, self.image_url);
        set(&mut image.caption, self.caption);
        set(&mut image.sort_order, self.order);
    }
}

// ============================================================================
// Gifts
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GiftItemType {
    /// Links out to a shop or registry page.
    External,
    /// Informational card, e.g. bank details for a honeymoon fund.
    Card,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GiftItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub image_url: Option<String>,
    pub item_type: GiftItemType,
    #[serde(rename = "order")]
    pub sort_order: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewGiftItem {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub link: String,
    pub image_url: Option<String>,
    pub item_type: GiftItemType,
    pub order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GiftItemPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub description: Option<Option<String>>,
    pub link: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub image_url: Option<Option<String>>,
    pub item_type: Option<GiftItemType>,
    pub order: Option<i64>,
}

impl GiftItemPatch {
    pub fn apply(self, item: &mut GiftItem) {
        set(&mut item.title, self.title);
        set(&mut item.description, self.description);
        set(&mut item.link, self.link);
        set(&mut item.image_url, self.image_url);
        set(&mut item.item_type, self.item_type);
        set(&mut item.sort_order, self.order);
    }
}

// ============================================================================
// RSVP
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rsvp {
    pub id: i64,
    pub guest_name: String,
    pub email: String,
    pub num_attendees: i64,
    pub dietary_restrictions: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRsvp {
    pub guest_name: String,
    pub email: String,
    #[serde(default = "one")]
    pub num_attendees: i64,
    pub dietary_restrictions: Option<String>,
    pub message: Option<String>,
}

fn one() -> i64 {
    1
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewRsvp {
    /// At least one attendee; blank optional text becomes absent.
    pub fn normalized(self) -> Self {
        Self {
            guest_name: self.guest_name.trim().to_string(),
            email: self.email.trim().to_string(),
            num_attendees: self.num_attendees.max(1),
            dietary_restrictions: non_blank(self.dietary_restrictions),
            message: non_blank(self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_distinguishes_missing_from_null() {
        let patch: StoryImagePatch = serde_json::from_str(r#"{"caption": null}"#).unwrap();
        assert_eq!(patch.caption, Some(None));
        assert_eq!(patch.section_id, None);

        let mut image = StoryImage {
            id: 1,
            image_url: "a.png".into(),
            caption: Some("old".into()),
            sort_order: 3,
            section_id: Some(2),
        };
        patch.apply(&mut image);
        assert_eq!(image.caption, None);
        assert_eq!(image.section_id, Some(2));
        assert_eq!(image.sort_order, 3);
    }

    #[test]
    fn test_ordered_rows_serialize_order_field() {
        let section = StorySection {
            id: 1,
            title: "How we met".into(),
            content: "...".into(),
            sort_order: 4,
        };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["order"], 4);
        assert!(json.get("sort_order").is_none());
    }

    #[test]
    fn test_time_of_day_accepts_short_and_long_forms() {
        let event: NewTimelineEvent =
            serde_json::from_str(r#"{"time": "15:30", "title": "Ceremony"}"#).unwrap();
        assert_eq!(event.time, NaiveTime::from_hms_opt(15, 30, 0).unwrap());

        let patch: TimelineEventPatch = serde_json::from_str(r#"{"time": "18:00:00"}"#).unwrap();
        assert_eq!(patch.time, NaiveTime::from_hms_opt(18, 0, 0));

        assert!(serde_json::from_str::<NewTimelineEvent>(r#"{"time": "noon", "title": "x"}"#)
            .is_err());
    }

    #[test]
    fn test_gift_item_type_is_closed_set() {
        let item: NewGiftItem = serde_json::from_str(
            r#"{"title": "Honeymoon fund", "item_type": "card"}"#,
        )
        .unwrap();
        assert_eq!(item.item_type, GiftItemType::Card);
        assert_eq!(item.link, "");

        assert!(serde_json::from_str::<NewGiftItem>(
            r#"{"title": "x", "link": "y", "item_type": "voucher"}"#
        )
        .is_err());
    }

    #[test]
    fn test_rsvp_normalization() {
        let rsvp = NewRsvp {
            guest_name: "  Ana ".into(),
            email: "ana@example.com".into(),
            num_attendees: 0,
            dietary_restrictions: Some("   ".into()),
            message: Some(String::new()),
        }
        .normalized();
        assert_eq!(rsvp.guest_name, "Ana");
        assert_eq!(rsvp.num_attendees, 1);
        assert_eq!(rsvp.dietary_restrictions, None);
        assert_eq!(rsvp.message, None);
    }

    #[test]
    fn test_info_patch_null_gallery_clears() {
        let mut section = WeddingInfoSection {
            id: 1,
            title: "Venue".into(),
            description: None,
            icon: None,
            section_type: "ceremony".into(),
            map_embed_url: None,
            image_url: None,
            gallery_urls: vec!["a.png".into()],
            additional_info: None,
            sort_order: 0,
        };
        let patch: InfoSectionPatch = serde_json::from_str(r#"{"gallery_urls": null}"#).unwrap();
        patch.apply(&mut section);
        assert!(section.gallery_urls.is_empty());
    }
}
