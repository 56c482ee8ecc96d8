//! Answer rendering. For a matched event, a facet rule table decides which
//! slice of the record the user asked about. For school facts, section
//! scans and a trigger cascade turn the school data into one-line answers.
//! Rule order is load-bearing in both tables: more specific rules sit above
//! the generic ones that would otherwise shadow them.

use crate::knowledge::{EventEntry, EventRecord, FieldValue, SchoolData};
use crate::normalize::{normalize_key, QueryForms};

pub const NOT_AVAILABLE: &str = "N/A";

/// The kind of information a query asks for about an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Venue,
    Timing,
    Rules,
    Prizes,
    Format,
    Participants,
    Registration,
    Description,
}

pub struct FacetRule {
    pub facet: Facet,
    pub triggers: &'static [&'static str],
}

/// Facet triggers, scanned top to bottom against the lower-cased query; the
/// first rule with a hit wins. Triggers are stems, so "rounds" matches
/// "round" by containment.
pub const FACET_RULES: &[FacetRule] = &[
    FacetRule {
        facet: Facet::Venue,
        triggers: &["venue", "location", "place", "hall", "where"],
    },
    FacetRule {
        facet: Facet::Timing,
        triggers: &["time", "date", "schedule", "when", "timing", "duration"],
    },
    FacetRule {
        facet: Facet::Rules,
        triggers: &["rule", "instruction", "regulation", "guideline"],
    },
    FacetRule {
        facet: Facet::Prizes,
        triggers: &["prize", "award", "recognition", "winner", "reward"],
    },
    FacetRule {
        facet: Facet::Format,
        triggers: &["format", "structure", "round", "how", "process"],
    },
    FacetRule {
        facet: Facet::Participants,
        triggers: &["who", "participant", "eligib", "classes", "student"],
    },
    FacetRule {
        facet: Facet::Registration,
        triggers: &["registration", "register", "deadline", "apply", "entry"],
    },
    FacetRule {
        facet: Facet::Description,
        triggers: &["description", "what is", "summary", "detail", "about", "tell me"],
    },
];

/// Pick the facet a query asks about, if any.
pub fn select_facet(query: &str) -> Option<Facet> {
    let lower = query.to_lowercase();
    FACET_RULES
        .iter()
        .find(|rule| rule.triggers.iter().any(|trigger| lower.contains(trigger)))
        .map(|rule| rule.facet)
}

/// Render the answer for a matched event: the requested facet, or a general
/// summary when the query names the event without asking for anything
/// specific.
pub fn event_answer(entry: &EventEntry, query: &str) -> String {
    match select_facet(query) {
        Some(facet) => render_facet(&entry.record, facet),
        None => general_summary(&entry.record),
    }
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

fn render_facet(event: &EventRecord, facet: Facet) -> String {
    let name = &event.event_name;
    match facet {
        Facet::Venue => match event.venue() {
            Some(venue) => format!("Venue for {name}: {venue}"),
            None => format!("Venue for {name}: venue details not available"),
        },
        Facet::Timing => format!(
            "{name} is scheduled on {} at {} (Duration: {}).",
            opt(&event.day),
            opt(&event.timing),
            opt(&event.duration),
        ),
        Facet::Rules => {
            if event.rules.is_empty() {
                format!("Rules for {name}: {NOT_AVAILABLE}")
            } else {
                format!("Rules for {name}: {}", event.rules.join("; "))
            }
        }
        Facet::Prizes => {
            if event.prizes.is_empty() {
                format!("Prizes for {name}: {NOT_AVAILABLE}")
            } else {
                format!("Prizes for {name}: {}", event.prizes.join(", "))
            }
        }
        Facet::Format => format!("Format of {name}: {}", opt(&event.format)),
        Facet::Participants => format!(
            "Eligible participants for {name}: Classes {}",
            opt(&event.class_range)
        ),
        Facet::Registration => match &event.registration_deadline {
            Some(deadline) => format!("Registration for {name} closes on {deadline}."),
            None => format!(
                "Registration details for {name} are not available. Please contact the school co-ordinator."
            ),
        },
        Facet::Description => format!("About {name}: {}", opt(&event.description)),
    }
}

fn general_summary(event: &EventRecord) -> String {
    let mut summary = format!(
        "{} (Classes {}): {}",
        event.event_name,
        opt(&event.class_range),
        opt(&event.description),
    );
    if let Some(venue) = event.venue() {
        summary.push_str(&format!("\nVenue: {venue}"));
    }
    summary
}

/// What a matched school-facts rule answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactAction {
    Vision,
    Mission,
    CoreValues,
    ContactDetails,
    /// A single named role from the staff directory.
    StaffRole {
        field: &'static str,
        label: &'static str,
    },
    Volunteers,
    StaffOverview,
    KeyFaculty,
    TeacherTraining,
    Developer,
}

pub struct FactRule {
    /// Matched by containment against the key form of the query, so the
    /// triggers are themselves written in key form (no spaces, no dashes).
    pub triggers: &'static [&'static str],
    /// Key-form words that veto the rule even when a trigger hits.
    pub excludes: &'static [&'static str],
    pub action: FactAction,
}

/// School-facts cascade, scanned top to bottom. Ordering carries the
/// disambiguation: "assistant vice principal" must hit before "vice
/// principal", which must hit before "principal"; likewise vice captain
/// before captain, where an exclude guards the shorter trigger.
pub const FACT_RULES: &[FactRule] = &[
    FactRule {
        triggers: &["vision"],
        excludes: &[],
        action: FactAction::Vision,
    },
    FactRule {
        triggers: &["mission"],
        excludes: &[],
        action: FactAction::Mission,
    },
    FactRule {
        triggers: &["corevalues", "values"],
        excludes: &[],
        action: FactAction::CoreValues,
    },
    FactRule {
        triggers: &["contactdetails", "contact"],
        excludes: &[],
        action: FactAction::ContactDetails,
    },
    FactRule {
        triggers: &["assistantviceprincipal", "asstviceprincipal"],
        excludes: &[],
        action: FactAction::StaffRole {
            field: "assistant vice principal",
            label: "Assistant Vice Principal",
        },
    },
    FactRule {
        triggers: &["viceprincipal"],
        excludes: &[],
        action: FactAction::StaffRole {
            field: "vice principal",
            label: "Vice Principal",
        },
    },
    FactRule {
        triggers: &["principal"],
        excludes: &[],
        action: FactAction::StaffRole {
            field: "principal",
            label: "Principal",
        },
    },
    FactRule {
        triggers: &["coordinator"],
        excludes: &[],
        action: FactAction::StaffRole {
            field: "school co-ordinator",
            label: "School Co-ordinator",
        },
    },
    FactRule {
        triggers: &["outsideschoolincharge"],
        excludes: &[],
        action: FactAction::StaffRole {
            field: "outside school incharge",
            label: "Outside School Incharge",
        },
    },
    FactRule {
        triggers: &["eventincharge", "eventsincharge"],
        excludes: &[],
        action: FactAction::StaffRole {
            field: "events incharge",
            label: "Events Incharge",
        },
    },
    FactRule {
        triggers: &["registrationincharge"],
        excludes: &[],
        action: FactAction::StaffRole {
            field: "registration incharge",
            label: "Registration Incharge",
        },
    },
    FactRule {
        triggers: &["schoolvicecaptain", "vicecaptain"],
        excludes: &[],
        action: FactAction::StaffRole {
            field: "school vice captain",
            label: "School Vice Captain",
        },
    },
    FactRule {
        triggers: &["schoolcaptain", "captain"],
        excludes: &["vice"],
        action: FactAction::StaffRole {
            field: "school captain",
            label: "School Captain",
        },
    },
    FactRule {
        triggers: &[
            "studentvolunteer",
            "volunteer",
            "studenthelper",
            "studentassistant",
            "studentsupport",
        ],
        excludes: &[],
        action: FactAction::Volunteers,
    },
    FactRule {
        triggers: &["teachers", "staff"],
        excludes: &[],
        action: FactAction::StaffOverview,
    },
    FactRule {
        triggers: &["seniorteacher", "faculty"],
        excludes: &[],
        action: FactAction::KeyFaculty,
    },
    FactRule {
        triggers: &["teachertraining"],
        excludes: &[],
        action: FactAction::TeacherTraining,
    },
    FactRule {
        triggers: &["chatbotdeveloper", "developer"],
        excludes: &[],
        action: FactAction::Developer,
    },
];

/// Answer a school-facts query, or `None` when nothing in the school data
/// applies and resolution should move on to event matching.
///
/// Section scans run first (locations, then infrastructure, then
/// co-curricular activities), then the trigger cascade.
pub fn facts_answer(school: &SchoolData, query: &str) -> Option<String> {
    let forms = QueryForms::new(query);

    let sections: [(&[(String, String)], fn(&str, &str) -> String); 3] = [
        (&school.locations, |key, value| {
            format!("The location of {key} is as follows: {value}")
        }),
        (&school.infrastructure, |key, value| format!("{key}: {value}")),
        (&school.co_curricular, |key, value| format!("{key}: {value}")),
    ];
    for (entries, render) in sections {
        if let Some((key, value)) = scan_section(entries, &forms) {
            return Some(render(key, value));
        }
    }

    FACT_RULES
        .iter()
        .find(|rule| rule_matches(rule, &forms))
        .map(|rule| render_fact(school, rule.action))
}

/// First entry whose key occurs in the query, comparing raw-lowercase or
/// key form so "science labs" and "sciencelabs" both land.
fn scan_section<'a>(
    entries: &'a [(String, String)],
    forms: &QueryForms,
) -> Option<(&'a str, &'a str)> {
    entries
        .iter()
        .find(|(key, _)| {
            let lower = key.to_lowercase();
            if !lower.is_empty() && forms.lower.contains(&lower) {
                return true;
            }
            let key_form = normalize_key(key);
            !key_form.is_empty() && forms.key.contains(&key_form)
        })
        .map(|(key, value)| (key.as_str(), value.as_str()))
}

fn rule_matches(rule: &FactRule, forms: &QueryForms) -> bool {
    rule.triggers.iter().any(|t| forms.key.contains(t))
        && !rule.excludes.iter().any(|x| forms.key.contains(x))
}

fn render_fact(school: &SchoolData, action: FactAction) -> String {
    match action {
        FactAction::Vision => format!(
            "Our vision: {}",
            school.vision.as_deref().unwrap_or(NOT_AVAILABLE)
        ),
        FactAction::Mission => format!(
            "Our mission: {}",
            school.mission.as_deref().unwrap_or(NOT_AVAILABLE)
        ),
        FactAction::CoreValues => {
            if school.core_values.is_empty() {
                format!("Our core values include: {NOT_AVAILABLE}")
            } else {
                format!("Our core values include: {}", school.core_values.join(", "))
            }
        }
        FactAction::ContactDetails => {
            match school.staff_field("contact details").and_then(non_empty_list) {
                Some(lines) => format!("Contact Details:\n{}", lines.join("\n")),
                None => "No contact details found.".to_string(),
            }
        }
        FactAction::StaffRole { field, label } => {
            let name = school
                .staff_field(field)
                .and_then(FieldValue::as_scalar)
                .unwrap_or(NOT_AVAILABLE);
            format!("The {label} is {name}.")
        }
        FactAction::Volunteers => {
            match school.staff_field("student volunteers").and_then(non_empty_list) {
                Some(names) => {
                    let mut answer = format!("Student Volunteers: {}", names.join(", "));
                    if let Some(emails) = school
                        .staff_field("student volunteers email ids")
                        .and_then(non_empty_list)
                    {
                        answer.push_str(&format!("\nEmails: {}", emails.join(", ")));
                    }
                    answer
                }
                None => "No student volunteers found.".to_string(),
            }
        }
        FactAction::StaffOverview => school
            .staff_field("teaching_staff_overview")
            .and_then(FieldValue::as_scalar)
            .unwrap_or(NOT_AVAILABLE)
            .to_string(),
        FactAction::KeyFaculty => {
            match school
                .staff_field("key_faculty_members")
                .and_then(non_empty_list)
            {
                Some(members) => format!("Key faculty members include: {}", members.join(", ")),
                None => format!("Key faculty members include: {NOT_AVAILABLE}"),
            }
        }
        FactAction::TeacherTraining => school
            .staff_field("facilities_for_teacher_training")
            .and_then(FieldValue::as_scalar)
            .unwrap_or(NOT_AVAILABLE)
            .to_string(),
        FactAction::Developer => {
            let developer = school.staff_field("chatbot-developer");
            let name = developer
                .and_then(|d| d.nested("name"))
                .unwrap_or(NOT_AVAILABLE);
            let email = developer
                .and_then(|d| d.nested("email"))
                .unwrap_or(NOT_AVAILABLE);
            format!("This chatbot was developed by {name}. You can reach them at {email}.")
        }
    }
}

fn non_empty_list(value: &FieldValue) -> Option<&[String]> {
    value.as_list().filter(|items| !items.is_empty())
}
