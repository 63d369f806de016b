//! # Enrollment Ledger
//!
//! The course catalog plus the per-student enrollment and completion
//! credentials.
//!
//! ## State Machine
//!
//! Each `(student, course)` pair moves one way only:
//!
//! ```text
//! Unenrolled ──register──▶ Enrolled ──submit_grade──▶ Completed
//! ```
//!
//! The pair's slot holds a single [`Standing`] value, so a pair can never
//! hold an enrollment and a completion at the same time. An absent slot is
//! `Unenrolled`; nothing ever removes a slot once written.
//!
//! ## Eligibility
//!
//! Identity and fee status are checked at `register` time only. Grading does
//! not re-check them, and revoking a student's identity later does not
//! retract an enrollment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use campus_protocol::config::{FIRST_CREDENTIAL_ID, MAX_GRADE, MIN_GRADE};
use campus_protocol::error::{LedgerError, LedgerResult};
use campus_protocol::types::{Address, CourseId, EnrollmentId, MetadataRef};

use crate::capability::{FeeView, IdentityView};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub instructor: String,
    pub duration_weeks: u32,
    pub credits: u32,
    pub active: bool,
}

/// Soulbound proof that a student is taking a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentCredential {
    pub id: EnrollmentId,
    pub student: Address,
    pub course_id: CourseId,
    pub metadata_ref: MetadataRef,
    pub enrolled_at: DateTime<Utc>,
}

/// Soulbound proof that a student finished a course, with the grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCredential {
    pub id: EnrollmentId,
    pub student: Address,
    pub course_id: CourseId,
    pub grade: u8,
    pub metadata_ref: MetadataRef,
    pub completed_at: DateTime<Utc>,
}

/// Where a `(student, course)` pair stands. Absence means unenrolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Enrolled(EnrollmentCredential),
    Completed(CompletionCredential),
}

/// Outcome of a successful [`EnrollmentLedger::submit_grade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graded {
    pub completion_id: EnrollmentId,
    /// The enrollment credential that was burned.
    pub burned_enrollment: EnrollmentId,
    pub grade: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentLedger {
    /// Catalog; a course's id is its index + 1.
    courses: Vec<Course>,
    standings: BTreeMap<Address, BTreeMap<CourseId, Standing>>,
    /// Live enrollment id → pair.
    enrollments: BTreeMap<EnrollmentId, (Address, CourseId)>,
    /// Completion id → pair.
    completions: BTreeMap<EnrollmentId, (Address, CourseId)>,
    /// Currently enrolled students per course, in registration order.
    rosters: BTreeMap<CourseId, Vec<Address>>,
    /// Number of courses each student is currently enrolled in.
    course_counts: BTreeMap<Address, u64>,
    next_enrollment_id: EnrollmentId,
    next_completion_id: EnrollmentId,
}

impl EnrollmentLedger {
    pub fn new() -> Self {
        Self {
            courses: Vec::new(),
            standings: BTreeMap::new(),
            enrollments: BTreeMap::new(),
            completions: BTreeMap::new(),
            rosters: BTreeMap::new(),
            course_counts: BTreeMap::new(),
            next_enrollment_id: FIRST_CREDENTIAL_ID,
            next_completion_id: FIRST_CREDENTIAL_ID,
        }
    }

    // -- Catalog ------------------------------------------------------------

    /// Adds an active course and returns its id.
    pub fn add_course(
        &mut self,
        name: &str,
        instructor: &str,
        duration_weeks: u32,
        credits: u32,
    ) -> LedgerResult<CourseId> {
        validate_course_fields(name, instructor, duration_weeks, credits)?;

        let id = self.courses.len() as CourseId + 1;
        self.courses.push(Course {
            id,
            name: name.to_string(),
            instructor: instructor.to_string(),
            duration_weeks,
            credits,
            active: true,
        });
        self.rosters.insert(id, Vec::new());
        Ok(id)
    }

    /// Replaces a course's descriptive fields. The active flag is kept.
    pub fn update_course(
        &mut self,
        course_id: CourseId,
        name: &str,
        instructor: &str,
        duration_weeks: u32,
        credits: u32,
    ) -> LedgerResult<()> {
        self.course(course_id)?;
        validate_course_fields(name, instructor, duration_weeks, credits)?;

        let course = self.course_mut(course_id)?;
        course.name = name.to_string();
        course.instructor = instructor.to_string();
        course.duration_weeks = duration_weeks;
        course.credits = credits;
        Ok(())
    }

    pub fn activate_course(&mut self, course_id: CourseId) -> LedgerResult<()> {
        self.course_mut(course_id)?.active = true;
        Ok(())
    }

    pub fn deactivate_course(&mut self, course_id: CourseId) -> LedgerResult<()> {
        self.course_mut(course_id)?.active = false;
        Ok(())
    }

    /// Deactivates every course. Returns the ids that were active before.
    pub fn deactivate_all_courses(&mut self) -> Vec<CourseId> {
        let mut changed = Vec::new();
        for course in self.courses.iter_mut().filter(|c| c.active) {
            course.active = false;
            changed.push(course.id);
        }
        changed
    }

    /// `getCourseDetails`.
    pub fn course(&self, course_id: CourseId) -> LedgerResult<&Course> {
        course_index(course_id)
            .and_then(|i| self.courses.get(i))
            .ok_or(LedgerError::CourseNotFound(course_id))
    }

    fn course_mut(&mut self, course_id: CourseId) -> LedgerResult<&mut Course> {
        course_index(course_id)
            .and_then(|i| self.courses.get_mut(i))
            .ok_or(LedgerError::CourseNotFound(course_id))
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    // -- Enrollment ---------------------------------------------------------

    /// Enrolls `student` in `course_id` and returns the new enrollment id.
    ///
    /// Checks, in order: null student, course exists, course active,
    /// student owns an identity, student has a fee receipt, pair still
    /// unenrolled. No state changes unless all of them pass.
    pub fn register(
        &mut self,
        identity: &impl IdentityView,
        fees: &impl FeeView,
        student: &Address,
        course_id: CourseId,
        metadata_ref: MetadataRef,
    ) -> LedgerResult<EnrollmentId> {
        if student.is_null() {
            return Err(LedgerError::InvalidAddress("student"));
        }
        if !self.course(course_id)?.active {
            return Err(LedgerError::CourseInactive(course_id));
        }
        if !identity.has_live_identity(student) {
            return Err(LedgerError::MissingIdentity(student.clone()));
        }
        if !fees.verify_fee_paid(student) {
            return Err(LedgerError::MissingFeeReceipt(student.clone()));
        }
        if self.standing_of(student, course_id).is_some() {
            return Err(LedgerError::AlreadyEnrolled {
                student: student.clone(),
                course_id,
            });
        }

        let id = self.next_enrollment_id;
        let credential = EnrollmentCredential {
            id,
            student: student.clone(),
            course_id,
            metadata_ref,
            enrolled_at: Utc::now(),
        };
        self.standings
            .entry(student.clone())
            .or_default()
            .insert(course_id, Standing::Enrolled(credential));
        self.enrollments.insert(id, (student.clone(), course_id));
        self.rosters.entry(course_id).or_default().push(student.clone());
        *self.course_counts.entry(student.clone()).or_insert(0) += 1;
        self.next_enrollment_id += 1;

        Ok(id)
    }

    /// Burns the pair's enrollment and mints a completion carrying `grade`.
    ///
    /// Checks, in order: course exists, pair not already completed
    /// ([`LedgerError::AlreadyGraded`]), pair enrolled
    /// ([`LedgerError::NotRegistered`]), grade in `0..=10`.
    pub fn submit_grade(
        &mut self,
        student: &Address,
        course_id: CourseId,
        grade: i64,
        metadata_ref: MetadataRef,
    ) -> LedgerResult<Graded> {
        self.course(course_id)?;

        let enrollment_id = match self.standing_of(student, course_id) {
            Some(Standing::Enrolled(enrollment)) => enrollment.id,
            Some(Standing::Completed(_)) => {
                return Err(LedgerError::AlreadyGraded {
                    student: student.clone(),
                    course_id,
                })
            }
            None => {
                return Err(LedgerError::NotRegistered {
                    student: student.clone(),
                    course_id,
                })
            }
        };
        let grade = u8::try_from(grade)
            .ok()
            .filter(|g| (MIN_GRADE..=MAX_GRADE).contains(g))
            .ok_or(LedgerError::InvalidGrade { grade })?;

        let completion_id = self.next_completion_id;
        let completion = CompletionCredential {
            id: completion_id,
            student: student.clone(),
            course_id,
            grade,
            metadata_ref,
            completed_at: Utc::now(),
        };
        if let Some(slots) = self.standings.get_mut(student) {
            slots.insert(course_id, Standing::Completed(completion));
        }
        self.enrollments.remove(&enrollment_id);
        self.completions.insert(completion_id, (student.clone(), course_id));
        if let Some(roster) = self.rosters.get_mut(&course_id) {
            roster.retain(|s| s != student);
        }
        if let Some(count) = self.course_counts.get_mut(student) {
            *count = count.saturating_sub(1);
        }
        self.next_completion_id += 1;

        Ok(Graded {
            completion_id,
            burned_enrollment: enrollment_id,
            grade,
        })
    }

    /// Enrollment credentials never move.
    pub fn transfer_enrollment(&self, id: EnrollmentId) -> LedgerResult<()> {
        Err(LedgerError::SoulboundTransferDisallowed {
            credential: "enrollment",
            id,
        })
    }

    /// Completion credentials never move.
    pub fn transfer_completion(&self, id: EnrollmentId) -> LedgerResult<()> {
        Err(LedgerError::SoulboundTransferDisallowed {
            credential: "completion",
            id,
        })
    }

    // -- Reads --------------------------------------------------------------

    pub fn standing_of(&self, student: &Address, course_id: CourseId) -> Option<&Standing> {
        self.standings.get(student)?.get(&course_id)
    }

    /// True only while the pair is `Enrolled`.
    pub fn is_student_registered(&self, student: &Address, course_id: CourseId) -> bool {
        matches!(
            self.standing_of(student, course_id),
            Some(Standing::Enrolled(_))
        )
    }

    /// Students currently enrolled in the course, in registration order.
    pub fn course_students(&self, course_id: CourseId) -> LedgerResult<&[Address]> {
        self.course(course_id)?;
        Ok(self
            .rosters
            .get(&course_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Number of courses the student is currently enrolled in (not completed).
    pub fn student_course_count(&self, student: &Address) -> u64 {
        self.course_counts.get(student).copied().unwrap_or(0)
    }

    pub fn enrollment(&self, id: EnrollmentId) -> LedgerResult<&EnrollmentCredential> {
        let (student, course_id) = self
            .enrollments
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("enrollment credential", id))?;
        match self.standing_of(student, *course_id) {
            Some(Standing::Enrolled(e)) => Ok(e),
            _ => Err(LedgerError::not_found("enrollment credential", id)),
        }
    }

    pub fn completion(&self, id: EnrollmentId) -> LedgerResult<&CompletionCredential> {
        let (student, course_id) = self
            .completions
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("completion credential", id))?;
        match self.standing_of(student, *course_id) {
            Some(Standing::Completed(c)) => Ok(c),
            _ => Err(LedgerError::not_found("completion credential", id)),
        }
    }

    pub fn live_enrollments(&self) -> usize {
        self.enrollments.len()
    }

    pub fn total_completions(&self) -> usize {
        self.completions.len()
    }
}

impl Default for EnrollmentLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn course_index(course_id: CourseId) -> Option<usize> {
    course_id.checked_sub(1).map(|i| i as usize)
}

fn validate_course_fields(
    name: &str,
    instructor: &str,
    duration_weeks: u32,
    credits: u32,
) -> LedgerResult<()> {
    let reason = if name.trim().is_empty() {
        "course name cannot be empty"
    } else if instructor.trim().is_empty() {
        "instructor name cannot be empty"
    } else if duration_weeks == 0 {
        "duration must be greater than 0"
    } else if credits == 0 {
        "credits must be greater than 0"
    } else {
        return Ok(());
    };
    Err(LedgerError::InvalidCourseParams {
        reason: reason.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::fixtures::Allow;
    use campus_protocol::error::ErrorKind;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn with_math() -> EnrollmentLedger {
        let mut ledger = EnrollmentLedger::new();
        ledger.add_course("Math 101", "Prof. Smith", 12, 3).unwrap();
        ledger
    }

    #[test]
    fn courses_numbered_from_one_and_start_active() {
        let mut ledger = EnrollmentLedger::new();
        let a = ledger.add_course("Math 101", "Prof. Smith", 12, 3).unwrap();
        let b = ledger.add_course("Physics", "Dr. Jones", 10, 4).unwrap();
        assert_eq!((a, b), (1, 2));
        assert!(ledger.course(1).unwrap().active);
        assert_eq!(ledger.course_count(), 2);
    }

    #[test]
    fn invalid_course_fields_rejected() {
        let mut ledger = EnrollmentLedger::new();
        let cases = [
            ("", "Prof", 1, 1, "course name"),
            ("Math", " ", 1, 1, "instructor"),
            ("Math", "Prof", 0, 1, "duration"),
            ("Math", "Prof", 1, 0, "credits"),
        ];
        for (name, instructor, weeks, credits, needle) in cases {
            match ledger.add_course(name, instructor, weeks, credits) {
                Err(LedgerError::InvalidCourseParams { reason }) => {
                    assert!(reason.contains(needle), "{reason}")
                }
                other => panic!("expected InvalidCourseParams, got {other:?}"),
            }
        }
        assert_eq!(ledger.course_count(), 0);
    }

    #[test]
    fn update_keeps_active_flag() {
        let mut ledger = with_math();
        ledger.deactivate_course(1).unwrap();
        ledger.update_course(1, "Math 102", "Prof. Lee", 14, 4).unwrap();
        let course = ledger.course(1).unwrap();
        assert_eq!(course.name, "Math 102");
        assert_eq!(course.credits, 4);
        assert!(!course.active);
    }

    #[test]
    fn unknown_course_crud_fails() {
        let mut ledger = with_math();
        assert_eq!(
            ledger.activate_course(7).unwrap_err().kind(),
            ErrorKind::CourseNotFound
        );
        assert_eq!(
            ledger.update_course(0, "x", "y", 1, 1).unwrap_err().kind(),
            ErrorKind::CourseNotFound
        );
    }

    #[test]
    fn deactivate_all_reports_changed_courses() {
        let mut ledger = with_math();
        ledger.add_course("Physics", "Dr. Jones", 10, 4).unwrap();
        ledger.deactivate_course(2).unwrap();
        assert_eq!(ledger.deactivate_all_courses(), vec![1]);
        assert!(ledger.courses().iter().all(|c| !c.active));
    }

    #[test]
    fn register_updates_roster_and_count() {
        let ok = Allow::of(&["0xs"]);
        let mut ledger = with_math();
        let id = ledger
            .register(&ok, &ok, &addr("0xs"), 1, "ipfs://e".into())
            .unwrap();
        assert_eq!(id, 1);
        assert!(ledger.is_student_registered(&addr("0xs"), 1));
        assert_eq!(ledger.course_students(1).unwrap(), &[addr("0xs")]);
        assert_eq!(ledger.student_course_count(&addr("0xs")), 1);
        assert_eq!(ledger.enrollment(1).unwrap().course_id, 1);
    }

    #[test]
    fn register_check_order() {
        let none = Allow::default();
        let ids_only = Allow::of(&["0xs"]);
        let mut ledger = with_math();

        let err = ledger
            .register(&none, &none, &addr("0xs"), 9, "m".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CourseNotFound);

        let err = ledger
            .register(&none, &none, &addr("0xs"), 1, "m".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingIdentity);

        let err = ledger
            .register(&ids_only, &none, &addr("0xs"), 1, "m".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingFeeReceipt);

        ledger.deactivate_course(1).unwrap();
        let err = ledger
            .register(&ids_only, &ids_only, &addr("0xs"), 1, "m".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CourseInactive);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let ok = Allow::of(&["0xs"]);
        let mut ledger = with_math();
        ledger.register(&ok, &ok, &addr("0xs"), 1, "m".into()).unwrap();
        let err = ledger
            .register(&ok, &ok, &addr("0xs"), 1, "m".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyEnrolled);
        assert_eq!(ledger.course_students(1).unwrap().len(), 1);
    }

    #[test]
    fn grading_moves_pair_to_completed() {
        let ok = Allow::of(&["0xs"]);
        let mut ledger = with_math();
        let enrollment = ledger.register(&ok, &ok, &addr("0xs"), 1, "m".into()).unwrap();
        let graded = ledger.submit_grade(&addr("0xs"), 1, 8, "ipfs://c".into()).unwrap();

        assert_eq!(graded.burned_enrollment, enrollment);
        assert_eq!(graded.grade, 8);
        assert!(!ledger.is_student_registered(&addr("0xs"), 1));
        assert!(ledger.course_students(1).unwrap().is_empty());
        assert_eq!(ledger.student_course_count(&addr("0xs")), 0);
        assert_eq!(
            ledger.enrollment(enrollment).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(ledger.completion(graded.completion_id).unwrap().grade, 8);
    }

    #[test]
    fn second_grade_reports_already_graded() {
        let ok = Allow::of(&["0xs"]);
        let mut ledger = with_math();
        ledger.register(&ok, &ok, &addr("0xs"), 1, "m".into()).unwrap();
        ledger.submit_grade(&addr("0xs"), 1, 8, "c1".into()).unwrap();
        let err = ledger.submit_grade(&addr("0xs"), 1, 9, "c2".into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyGraded);
    }

    #[test]
    fn completed_pair_cannot_reregister() {
        let ok = Allow::of(&["0xs"]);
        let mut ledger = with_math();
        ledger.register(&ok, &ok, &addr("0xs"), 1, "m".into()).unwrap();
        ledger.submit_grade(&addr("0xs"), 1, 5, "c".into()).unwrap();
        let err = ledger
            .register(&ok, &ok, &addr("0xs"), 1, "m".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyEnrolled);
    }

    #[test]
    fn grading_unregistered_student_fails() {
        let mut ledger = with_math();
        let err = ledger.submit_grade(&addr("0xs"), 1, 5, "c".into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotRegistered);
    }

    #[test]
    fn out_of_range_grades_rejected_without_burning() {
        let ok = Allow::of(&["0xs"]);
        let mut ledger = with_math();
        ledger.register(&ok, &ok, &addr("0xs"), 1, "m".into()).unwrap();
        for grade in [-1, 11, 300] {
            let err = ledger
                .submit_grade(&addr("0xs"), 1, grade, "c".into())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidGrade);
        }
        assert!(ledger.is_student_registered(&addr("0xs"), 1));
        ledger.submit_grade(&addr("0xs"), 1, 10, "c".into()).unwrap();
    }

    #[test]
    fn grading_does_not_recheck_eligibility() {
        let ok = Allow::of(&["0xs"]);
        let mut ledger = with_math();
        ledger.register(&ok, &ok, &addr("0xs"), 1, "m".into()).unwrap();
        // Grading takes no eligibility views at all; deactivation is also ignored.
        ledger.deactivate_course(1).unwrap();
        assert!(ledger.submit_grade(&addr("0xs"), 1, 7, "c".into()).is_ok());
    }

    #[test]
    fn roster_removal_preserves_order() {
        let ok = Allow::of(&["0xa", "0xb", "0xc"]);
        let mut ledger = with_math();
        for s in ["0xa", "0xb", "0xc"] {
            ledger.register(&ok, &ok, &addr(s), 1, "m".into()).unwrap();
        }
        ledger.submit_grade(&addr("0xb"), 1, 6, "c".into()).unwrap();
        assert_eq!(
            ledger.course_students(1).unwrap(),
            &[addr("0xa"), addr("0xc")]
        );
    }

    #[test]
    fn credentials_are_soulbound() {
        let ledger = with_math();
        assert_eq!(
            ledger.transfer_enrollment(1).unwrap_err().kind(),
            ErrorKind::SoulboundTransferDisallowed
        );
        assert_eq!(
            ledger.transfer_completion(1).unwrap_err().kind(),
            ErrorKind::SoulboundTransferDisallowed
        );
    }
}
