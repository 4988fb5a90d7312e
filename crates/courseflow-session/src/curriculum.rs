//! Curriculum data model.
//!
//! The curriculum is the ordered modules/lessons/assessments tree of a
//! course, fetched once per session and treated as immutable for the
//! session's lifetime. Lesson order within a module and module order within
//! the curriculum are stable and drive next/previous navigation.

use serde::{Deserialize, Serialize};

// ============================================================================
// Lesson content
// ============================================================================

/// The kind of content a lesson carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    /// Embedded video with playback-position tracking.
    Video,
    /// Stored HTML or plain-text article body.
    Article,
    /// An attached lesson-level quiz.
    Quiz,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Article => write!(f, "article"),
            Self::Quiz => write!(f, "quiz"),
        }
    }
}

/// A single lesson within a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Unique lesson id.
    pub id: String,

    /// Lesson title.
    pub title: String,

    /// Kind of content this lesson renders.
    pub content_type: ContentType,

    /// Video URL, present for video lessons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Video duration in seconds, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<u32>,

    /// Article body (stored HTML or plain description).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_body: Option<String>,

    /// Whether the lesson is viewable without enrollment.
    #[serde(default)]
    pub free_preview: bool,

    /// Quiz attached at lesson level, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Assessment>,
}

// ============================================================================
// Assessments and questions
// ============================================================================

/// The level at which an assessment sits in the curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentLevel {
    /// Quiz attached to a single lesson.
    LessonQuiz,
    /// Assessment closing a module.
    ModuleAssessment,
    /// The course's final assessment.
    CourseFinal,
}

impl std::fmt::Display for AssessmentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LessonQuiz => write!(f, "lesson quiz"),
            Self::ModuleAssessment => write!(f, "module assessment"),
            Self::CourseFinal => write!(f, "final assessment"),
        }
    }
}

/// The kind of answer a question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// One option selected from `options`.
    MultipleChoice,
    /// True/false selection.
    TrueFalse,
    /// Short free-text answer, matched trimmed and case-insensitively.
    ShortAnswer,
    /// Long free-text answer; any non-empty answer earns full points here
    /// (manual grading is outside this flow).
    Essay,
}

/// A single gradable question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique question id.
    pub id: String,

    /// Question text.
    pub text: String,

    /// Kind of answer expected.
    pub question_type: QuestionType,

    /// Answer options, present only for multiple-choice questions.
    #[serde(default)]
    pub options: Vec<String>,

    /// The correct answer, compared per `question_type` rules.
    pub correct_answer: String,

    /// Points awarded on a correct answer.
    pub points: f64,

    /// Points subtracted on a wrong answer, when negative marking applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_points: Option<f64>,

    /// Explanation shown after review, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Difficulty tag (free-form, e.g. "easy").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// A gradable set of questions at lesson, module, or course level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Unique assessment id.
    pub id: String,

    /// Assessment title.
    pub title: String,

    /// Level this assessment sits at.
    pub level: AssessmentLevel,

    /// Ordered questions.
    pub questions: Vec<Question>,

    /// Passing score as a percentage (0-100).
    pub passing_score: f64,

    /// Maximum attempts allowed, unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Time limit in minutes, untimed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,

    /// Whether the assessment must be passed for course completion.
    #[serde(default)]
    pub required: bool,

    /// Whether correct answers are revealed in review.
    #[serde(default)]
    pub show_correct_answers: bool,

    /// Whether retakes are allowed at all.
    #[serde(default)]
    pub allow_retake: bool,

    /// Whether question order is shuffled per attempt.
    #[serde(default)]
    pub randomize_questions: bool,
}

impl Assessment {
    /// Sum of all question points.
    #[must_use]
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

// ============================================================================
// Modules and the curriculum tree
// ============================================================================

/// An ordered group of lessons with an optional closing assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Unique module id.
    pub id: String,

    /// Module title.
    pub title: String,

    /// Ordered lessons.
    pub lessons: Vec<Lesson>,

    /// Module-closing assessment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment>,
}

/// The full modules/lessons/assessments tree of one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curriculum {
    /// The owning course id. Some backends omit this from the curriculum
    /// payload (the caller already knows which course it asked for), so it
    /// defaults to empty and is backfilled by the fetching client.
    #[serde(default)]
    pub course_id: String,

    /// Course title.
    pub course_title: String,

    /// Ordered modules.
    pub modules: Vec<Module>,

    /// The course's final assessment, at most one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_assessment: Option<Assessment>,
}

impl Curriculum {
    /// Total number of lessons across all modules.
    #[must_use]
    pub fn total_lessons(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    /// Lesson ids flattened into one ordered sequence.
    ///
    /// This ordering is the single source of truth for next/previous
    /// navigation.
    #[must_use]
    pub fn lesson_order(&self) -> Vec<String> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter().map(|l| l.id.clone()))
            .collect()
    }

    /// The first lesson of the first module, if any lesson exists.
    #[must_use]
    pub fn first_lesson(&self) -> Option<&Lesson> {
        self.modules.iter().flat_map(|m| m.lessons.iter()).next()
    }

    /// Looks up a lesson anywhere in the tree.
    #[must_use]
    pub fn find_lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter())
            .find(|l| l.id == lesson_id)
    }

    /// Looks up an assessment by id at any level: lesson quizzes, module
    /// assessments, then the final assessment.
    #[must_use]
    pub fn find_assessment(&self, assessment_id: &str) -> Option<&Assessment> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter().filter_map(|l| l.quiz.as_ref()))
            .chain(self.modules.iter().filter_map(|m| m.assessment.as_ref()))
            .chain(self.final_assessment.as_ref())
            .find(|a| a.id == assessment_id)
    }

    /// The lesson a quiz is attached to, for lesson-level assessments.
    #[must_use]
    pub fn lesson_for_quiz(&self, assessment_id: &str) -> Option<&Lesson> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter())
            .find(|l| l.quiz.as_ref().is_some_and(|q| q.id == assessment_id))
    }
}
