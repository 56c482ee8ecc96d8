use conclave_chat_rs::context::ContextMemory;
use conclave_chat_rs::facet::{event_answer, facts_answer, select_facet, Facet};
use conclave_chat_rs::knowledge::KnowledgeBases;
use conclave_chat_rs::matcher::{find_event, similarity, FUZZY_CUTOFF};
use conclave_chat_rs::normalize::{normalize, normalize_key, QueryForms};

/// Bundled knowledge, as served when no data directory is given.
fn bundled() -> KnowledgeBases {
    KnowledgeBases::load(None)
}

#[test]
fn normalize_maps_number_words_to_digits() {
    assert_eq!(normalize("the first event"), "the 1 event");
    assert_eq!(normalize("The 1st Event!"), "the 1 event");
    assert_eq!(normalize("tenth"), "10");
    assert_eq!(normalize("the first event"), normalize("the 1st event"));
}

#[test]
fn normalize_strips_punctuation_and_collapses_whitespace() {
    assert_eq!(normalize("  Where's   the   HALL?  "), "wheres the hall");
    assert_eq!(normalize("co-ordinator"), "coordinator");
}

#[test]
fn normalize_is_idempotent() {
    for raw in ["Where is the 2nd event?", "  MIXED   Case  ", "first prize!!"] {
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn normalize_key_removes_spaces_and_dashes() {
    assert_eq!(normalize_key("Vice Principal"), "viceprincipal");
    assert_eq!(normalize_key("school co-ordinator"), "schoolcoordinator");
    let key = normalize_key("Core - Values");
    assert_eq!(normalize_key(&key), key);
}

#[test]
fn query_forms_carry_all_three_shapes() {
    let forms = QueryForms::new("  Who is the 1st Vice-Captain? ");
    assert_eq!(forms.lower, "who is the 1st vice-captain?");
    assert_eq!(forms.norm, "who is the 1 vicecaptain");
    assert_eq!(forms.key, "whoisthe1stvicecaptain?");
}

#[test]
fn exact_key_matches_event() {
    let kb = bundled();
    let entry = find_event(&kb.events, "scriptorium").expect("key should match");
    assert_eq!(entry.record.event_name, "Scriptorium");
}

#[test]
fn display_name_inside_query_matches_event() {
    let kb = bundled();
    let entry = find_event(&kb.events, "Tell me about Grand Colloquy please").unwrap();
    assert_eq!(entry.key, "colloquy");
}

#[test]
fn word_overlap_matches_partial_name() {
    // No key or full display name appears in this query; only the shared
    // words "united" and "nations" tie it to Model United Nations.
    let kb = bundled();
    let entry = find_event(&kb.events, "the united nations simulation").unwrap();
    assert_eq!(entry.key, "mun");
}

#[test]
fn short_stopwords_never_pull_in_an_event() {
    let kb = bundled();
    assert!(find_event(&kb.events, "is it on?").is_none());
}

#[test]
fn fuzzy_match_catches_typos() {
    let kb = bundled();
    assert!(similarity("scriptorum", "scriptorium") >= FUZZY_CUTOFF);
    let entry = find_event(&kb.events, "scriptorum").unwrap();
    assert_eq!(entry.key, "scriptorium");

    let entry = find_event(&kb.events, "mindsweap").unwrap();
    assert_eq!(entry.key, "mindsweep");
}

#[test]
fn fuzzy_match_rejects_unrelated_queries() {
    let kb = bundled();
    assert!(similarity("football tournament", "scriptorium") < FUZZY_CUTOFF);
    assert!(find_event(&kb.events, "football tournament").is_none());
    assert!(find_event(&kb.events, "what is the capital of France").is_none());
}

#[test]
fn facet_selection_prefers_earlier_rules() {
    assert_eq!(select_facet("when and where is it held"), Some(Facet::Venue));
    assert_eq!(select_facet("what time does it start"), Some(Facet::Timing));
    assert_eq!(select_facet("scriptorium"), None);
}

#[test]
fn venue_facet_uses_aliases() {
    let kb = bundled();
    let artisania = kb.events.get("artisania").unwrap();
    let answer = event_answer(artisania, "where is artisania held");
    assert!(answer.starts_with("Venue for Artisania:"), "got: {answer}");
    assert!(answer.contains("Art Studio"), "got: {answer}");

    let euphony = kb.events.get("euphony").unwrap();
    let answer = event_answer(euphony, "which hall is euphony in");
    assert!(answer.contains("Music Room Annexe"), "got: {answer}");
}

#[test]
fn venue_facet_degrades_when_no_alias_is_present() {
    let kb = bundled();
    let podium = kb.events.get("podium").unwrap();
    let answer = event_answer(podium, "where is podium");
    assert_eq!(answer, "Venue for Podium: venue details not available");
}

#[test]
fn timing_facet_fills_missing_fields_with_na() {
    let kb = bundled();
    let scriptorium = kb.events.get("scriptorium").unwrap();
    assert_eq!(
        event_answer(scriptorium, "when is scriptorium"),
        "Scriptorium is scheduled on Friday at 10:00 AM (Duration: 90 minutes)."
    );

    let euphony = kb.events.get("euphony").unwrap();
    assert_eq!(
        event_answer(euphony, "when is euphony"),
        "Euphony is scheduled on N/A at N/A (Duration: N/A)."
    );
}

#[test]
fn rules_and_prizes_facets_join_lists() {
    let kb = bundled();
    let scriptorium = kb.events.get("scriptorium").unwrap();

    let rules = event_answer(scriptorium, "rules of scriptorium");
    assert!(rules.starts_with("Rules for Scriptorium:"), "got: {rules}");
    assert!(rules.contains("; "), "rules should be one line: {rules}");

    let prizes = event_answer(scriptorium, "what prizes can I win");
    assert_eq!(prizes, "Prizes for Scriptorium: Trophy, Certificate of Merit");
}

#[test]
fn registration_facet_reports_deadline_or_degrades() {
    let kb = bundled();
    let scriptorium = kb.events.get("scriptorium").unwrap();
    assert_eq!(
        event_answer(scriptorium, "registration deadline for scriptorium"),
        "Registration for Scriptorium closes on Wednesday, 5:00 PM."
    );

    let chrysalis = kb.events.get("chrysalis").unwrap();
    let answer = event_answer(chrysalis, "registration deadline for chrysalis");
    assert!(
        answer.contains("not available"),
        "missing deadline should degrade: {answer}"
    );
}

#[test]
fn description_facet_and_general_summary() {
    let kb = bundled();
    let mindsweep = kb.events.get("mindsweep").unwrap();
    let about = event_answer(mindsweep, "tell me about mindsweep");
    assert!(about.starts_with("About MindSweep:"), "got: {about}");

    let scriptorium = kb.events.get("scriptorium").unwrap();
    let summary = event_answer(scriptorium, "scriptorium");
    assert!(summary.starts_with("Scriptorium (Classes 6-8):"), "got: {summary}");
    assert!(summary.contains("\nVenue: Auditorium"), "got: {summary}");
}

#[test]
fn section_entries_answer_before_staff_rules() {
    let kb = bundled();
    let answer = facts_answer(&kb.school, "where is the Main Campus").unwrap();
    assert!(answer.contains("Ridgeway Road"), "got: {answer}");

    let answer = facts_answer(&kb.school, "tell me about the library").unwrap();
    assert!(answer.contains("20,000 titles"), "got: {answer}");

    let answer = facts_answer(&kb.school, "what does the robotics club do").unwrap();
    assert!(answer.contains("Wednesdays"), "got: {answer}");
}

#[test]
fn staff_rules_resolve_specific_before_generic() {
    let kb = bundled();
    let answer = facts_answer(&kb.school, "who is the assistant vice principal").unwrap();
    assert_eq!(answer, "The Assistant Vice Principal is Ms. Lily D'Souza.");

    let answer = facts_answer(&kb.school, "who is the vice principal").unwrap();
    assert_eq!(answer, "The Vice Principal is Mr. Arvind Bhatia.");

    let answer = facts_answer(&kb.school, "who is the principal").unwrap();
    assert_eq!(answer, "The Principal is Dr. Kavita Raghunathan.");
}

#[test]
fn captain_rule_excludes_vice_captain_queries() {
    let kb = bundled();
    let answer = facts_answer(&kb.school, "who is the school captain").unwrap();
    assert_eq!(answer, "The School Captain is Aarav Malhotra.");

    let answer = facts_answer(&kb.school, "who is the vice captain").unwrap();
    assert_eq!(answer, "The School Vice Captain is Sanya Iyer.");
}

#[test]
fn incharge_roles_resolve_by_key_form() {
    let kb = bundled();
    let answer = facts_answer(&kb.school, "who is the events incharge").unwrap();
    assert_eq!(answer, "The Events Incharge is Mrs. Shalini Rao.");

    let answer = facts_answer(&kb.school, "who is the registration incharge").unwrap();
    assert_eq!(answer, "The Registration Incharge is Mr. Dinesh Kulkarni.");

    let answer = facts_answer(&kb.school, "who is the outside school incharge").unwrap();
    assert_eq!(answer, "The Outside School Incharge is Mr. Joseph Fernandes.");

    let answer = facts_answer(&kb.school, "who is the school co-ordinator").unwrap();
    assert_eq!(answer, "The School Co-ordinator is Mrs. Meera Pillai.");
}

#[test]
fn teaching_staff_overview_answer() {
    let kb = bundled();
    let answer = facts_answer(&kb.school, "how many teachers does the school have").unwrap();
    assert!(answer.contains("74 teaching staff"), "got: {answer}");
}

#[test]
fn mission_vision_and_values_answers() {
    let kb = bundled();
    let vision = facts_answer(&kb.school, "what is the school's vision").unwrap();
    assert!(vision.starts_with("Our vision:"), "got: {vision}");

    let mission = facts_answer(&kb.school, "what is your mission").unwrap();
    assert!(mission.starts_with("Our mission:"), "got: {mission}");

    let values = facts_answer(&kb.school, "what are the core values").unwrap();
    assert_eq!(
        values,
        "Our core values include: Integrity, Curiosity, Service, Resilience"
    );
}

#[test]
fn volunteers_answer_includes_emails() {
    let kb = bundled();
    let answer = facts_answer(&kb.school, "who are the student volunteers").unwrap();
    assert!(answer.contains("Rohan Shetty"), "got: {answer}");
    assert!(answer.contains("diya.kapoor@juniperhillschool.in"), "got: {answer}");
}

#[test]
fn contact_faculty_training_and_developer_answers() {
    let kb = bundled();
    let contacts = facts_answer(&kb.school, "contact details please").unwrap();
    assert!(contacts.starts_with("Contact Details:"), "got: {contacts}");
    assert!(contacts.contains("+91 98200 11223"), "got: {contacts}");

    let faculty = facts_answer(&kb.school, "who are the key faculty members").unwrap();
    assert!(faculty.contains("Mrs. Anita Krishnan (Mathematics)"), "got: {faculty}");

    let training = facts_answer(&kb.school, "what teacher training facilities exist").unwrap();
    assert!(training.contains("residential training block"), "got: {training}");

    let developer = facts_answer(&kb.school, "who is the chatbot developer").unwrap();
    assert!(developer.contains("Tanvi Deshmukh"), "got: {developer}");
}

#[test]
fn unrelated_queries_get_no_fact_answer() {
    let kb = bundled();
    assert!(facts_answer(&kb.school, "what is the weather today").is_none());
    assert!(facts_answer(&kb.school, "scriptorium").is_none());
}

#[test]
fn candidate_queries_without_topic_pass_the_query_through() {
    let context = ContextMemory::new();
    let (variants, used) = context.candidate_queries("s1", "what are the prizes?");
    assert!(!used);
    assert_eq!(variants, vec!["what are the prizes?".to_string()]);
}

#[test]
fn candidate_queries_splice_remembered_topic_for_follow_ups() {
    let kb = bundled();
    let context = ContextMemory::new();
    context.note_response("s1", "Venue for Scriptorium: Auditorium", &kb.events);

    let (variants, used) = context.candidate_queries("s1", "what are the prizes?");
    assert!(used);
    assert_eq!(variants[0], "Scriptorium what are the prizes?");
    assert!(variants.contains(&"Scriptorium".to_string()));

    // A query without any follow-up word ignores the remembered topic.
    let (variants, used) = context.candidate_queries("s1", "nice weather today");
    assert!(!used);
    assert_eq!(variants, vec!["nice weather today".to_string()]);
}

#[test]
fn note_response_prefers_roster_order_over_text_order() {
    let kb = bundled();
    let context = ContextMemory::new();
    context.note_response("s1", "MindSweep and Scriptorium are both on Friday", &kb.events);
    assert_eq!(context.remembered_topic("s1"), Some("Scriptorium".to_string()));
}

#[test]
fn context_is_per_session_and_clearable() {
    let kb = bundled();
    let context = ContextMemory::new();
    context.note_response("a", "About Podium: public speaking", &kb.events);
    assert_eq!(context.remembered_topic("a"), Some("Podium".to_string()));
    assert_eq!(context.remembered_topic("b"), None);

    context.clear("a");
    assert_eq!(context.remembered_topic("a"), None);
}
