use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Platform role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Learner,
    Tutor,
    OrgAdmin,
}

/// Moderation status of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Pending,
    Active,
    Suspended,
    Banned,
    Rejected,
}

impl UserStatus {
    /// Suspended and banned accounts may not act on the platform.
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::Suspended | Self::Banned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "lesson_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonType {
    Video,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "approval_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "purchase_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Success,
    Refunded,
}

/// Reason a learner earned points for a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "award_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AwardKind {
    LessonCompleted,
    QuizPassed,
}

/// User mirrored from the identity provider
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Identity provider subject id (unique)
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub expertise: Vec<String>,
    pub interests: Vec<String>,
    pub image_url: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course owned by a single tutor
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Price in minor currency units; `None` or `0` means free
    pub price: Option<i64>,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Price with "absent" folded into zero.
    pub fn effective_price(&self) -> i64 {
        self.price.unwrap_or(0)
    }

    pub fn is_free(&self) -> bool {
        self.effective_price() == 0
    }

    /// Published and approved, so shown in the public catalog.
    pub fn is_listed(&self) -> bool {
        self.is_published && self.approval_status == ApprovalStatus::Approved
    }
}

/// Catalog listing row with engagement rollups
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub image_url: Option<String>,
    pub tutor_id: Uuid,
    pub tutor_name: Option<String>,
    pub lesson_count: i64,
    pub student_count: i64,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub like_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Chapter {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub lesson_type: LessonType,
    pub position: i32,
    pub is_free_preview: bool,
    pub created_at: DateTime<Utc>,
}

/// A lesson joined with everything access decisions need
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LessonContext {
    pub lesson_id: Uuid,
    pub chapter_id: Uuid,
    pub course_id: Uuid,
    pub tutor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub lesson_type: LessonType,
    pub is_free_preview: bool,
    pub playback_id: Option<String>,
    pub video_upload_id: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VideoAsset {
    pub lesson_id: Uuid,
    pub asset_id: String,
    pub playback_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`; never serialized to learners
    #[serde(skip_serializing)]
    pub correct_option: i32,
    pub position: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub score: i32,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Successful enrollment fact; never updated after insert
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: i64,
    /// External payment reference (unique)
    pub reference: String,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: Uuid,
    pub is_completed: bool,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// A course the learner holds a purchase for
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EnrolledCourse {
    pub course_id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub tutor_name: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    /// Most recent progress activity in this course, if any
    pub last_accessed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_name: Option<String>,
    pub author_image_url: Option<String>,
    pub rating: i16,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, FromRow, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionWithAuthor {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub user_id: Uuid,
    pub author_name: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerWithAuthor {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub author_name: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Gamification counters for a user
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserPoints {
    pub user_id: Uuid,
    pub points: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub points: i64,
    pub current_streak: i32,
    pub joined_at: DateTime<Utc>,
}

/// Tutor's course with its lesson count, for analytics
#[derive(Debug, Clone, FromRow)]
pub struct TutorCourseRow {
    pub course_id: Uuid,
    pub title: String,
    pub is_published: bool,
    pub price: Option<i64>,
    pub total_lessons: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CoursePurchaseRow {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CompletedLessonsRow {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub completed_lessons: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuizScoreRow {
    pub lesson_id: Uuid,
    pub lesson_title: String,
    pub course_title: String,
    pub score: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RecentEnrollment {
    pub purchase_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub learner_name: Option<String>,
    pub learner_image_url: Option<String>,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LearningPathCourse {
    pub path_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub price: Option<i64>,
    pub position: i32,
}

/// Quiz attempt totals for one learner
#[derive(Debug, Clone, Copy, FromRow, Serialize, Deserialize)]
pub struct AttemptStats {
    pub attempts: i64,
    pub average_score: Option<f64>,
    pub passed: i64,
}
