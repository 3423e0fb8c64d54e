use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{ParsedResume, Section, SectionBuckets};

const HEADING_KEYWORDS: [&str; 8] = [
    "summary",
    "education",
    "skills",
    "projects",
    "experience",
    "certifications",
    "achievements",
    "profile",
];

const HEADING_MIN_CHARS: usize = 2;
const HEADING_MAX_CHARS: usize = 40;

const NAME_MIN_CAPITALIZED: usize = 1;
const NAME_MAX_CAPITALIZED: usize = 4;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d\s().-]{8,}\d").unwrap());
static CAPITALIZED_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z'.\-]*$").unwrap());

/// Short lines carrying a section keyword are headings; long lines are content
/// even when they mention a keyword.
pub fn is_section_heading(line: &str) -> bool {
    let trimmed = line.trim();
    let length = trimmed.chars().count();
    if !(HEADING_MIN_CHARS..=HEADING_MAX_CHARS).contains(&length) {
        return false;
    }

    let lower = trimmed.to_lowercase();
    HEADING_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn extract_email(line: &str) -> Option<&str> {
    EMAIL_RE.find(line).map(|m| m.as_str())
}

pub fn extract_phone(line: &str) -> Option<&str> {
    PHONE_RE.find(line).map(|m| m.as_str())
}

/// Returns the first email and the first phone number found across `lines`.
/// Each is matched independently, so one line can supply both.
pub fn extract_contacts<S: AsRef<str>>(lines: &[S]) -> (String, String) {
    let mut email: Option<&str> = None;
    let mut phone: Option<&str> = None;

    for line in lines {
        let line = line.as_ref();
        if email.is_none() {
            email = extract_email(line);
        }
        if phone.is_none() {
            phone = extract_phone(line);
        }
        if email.is_some() && phone.is_some() {
            break;
        }
    }

    (
        email.map(str::to_string).unwrap_or_default(),
        phone.map(str::to_string).unwrap_or_default(),
    )
}

/// Picks the first contact-free line with one to four capitalized words.
/// Falls back to the first line when nothing qualifies.
pub fn guess_name<S: AsRef<str>>(lines: &[S]) -> String {
    for raw in lines {
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if EMAIL_RE.is_match(line) || PHONE_RE.is_match(line) {
            continue;
        }

        let capitalized = line
            .split_whitespace()
            .filter(|token| CAPITALIZED_WORD_RE.is_match(token))
            .count();

        if (NAME_MIN_CAPITALIZED..=NAME_MAX_CAPITALIZED).contains(&capitalized) {
            return line.to_string();
        }
    }

    lines
        .first()
        .map(|line| line.as_ref().trim().to_string())
        .unwrap_or_default()
}

/// Buckets every line under the most recent heading. Lines before the first
/// heading, and lines under headings with no bucket (summary, profile), are dropped.
pub fn segment_sections<S: AsRef<str>>(lines: &[S]) -> SectionBuckets {
    let (buckets, _cursor) = lines.iter().fold(
        (SectionBuckets::default(), None::<Section>),
        |(mut buckets, cursor), raw| {
            let line = raw.as_ref();
            if is_section_heading(line) {
                let heading = line.trim().to_lowercase();
                return (buckets, Section::from_heading(&heading));
            }

            if let Some(section) = cursor {
                buckets.bucket_mut(section).push(line.to_string());
            }

            (buckets, cursor)
        },
    );

    buckets
}

pub fn parse_resume_lines<S: AsRef<str>>(lines: &[S]) -> ParsedResume {
    let (email, phone) = extract_contacts(lines);
    let name = guess_name(lines);
    let sections = segment_sections(lines);

    ParsedResume {
        name,
        email,
        phone,
        education: sections.education,
        skills: sections.skills,
        projects: sections.projects,
        experience: sections.experience,
        certifications: sections.certifications,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_section_heading_accepts_short_keyword_lines() {
        assert!(is_section_heading("Skills"));
        assert!(is_section_heading("  EDUCATION  "));
        assert!(is_section_heading("Professional Experience"));
        assert!(is_section_heading("Certifications & Achievements"));
        assert!(is_section_heading("Profile"));
        assert!(!is_section_heading("Python, AWS, Lambda"));
        assert!(!is_section_heading(""));
        assert!(!is_section_heading("   "));
    }

    #[test]
    fn is_section_heading_rejects_long_lines_with_keywords() {
        let line = "Applied machine learning skills to fraud detection at scale";
        assert!(line.trim().chars().count() > 40);
        assert!(!is_section_heading(line));
    }

    #[test]
    fn is_section_heading_length_bounds_are_inclusive() {
        let exactly_forty = format!("skills{}", "x".repeat(34));
        assert_eq!(exactly_forty.chars().count(), 40);
        assert!(is_section_heading(&exactly_forty));

        let forty_one = format!("skills{}", "x".repeat(35));
        assert!(!is_section_heading(&forty_one));
    }

    #[test]
    fn extract_contacts_reads_email_and_phone_from_one_line() {
        let lines = ["jane.doe@example.com | +1 (555) 123-4567"];
        let (email, phone) = extract_contacts(&lines);
        assert_eq!(email, "jane.doe@example.com");
        assert_eq!(phone, "+1 (555) 123-4567");
    }

    #[test]
    fn extract_contacts_keeps_first_match() {
        let lines = [
            "Phone: 555-987-6543",
            "first@example.com",
            "second@example.com",
            "Alt: 555-000-1111",
        ];
        let (email, phone) = extract_contacts(&lines);
        assert_eq!(email, "first@example.com");
        assert_eq!(phone, "555-987-6543");
    }

    #[test]
    fn extract_contacts_returns_empty_strings_when_missing() {
        let (email, phone) = extract_contacts(&["no contact here", "call 12345"]);
        assert_eq!(email, "");
        assert_eq!(phone, "");
    }

    #[test]
    fn extract_phone_requires_ten_characters_bounded_by_digits() {
        assert_eq!(extract_phone("9876543210"), Some("9876543210"));
        assert_eq!(extract_phone("tel 98765 43210 ext"), Some("98765 43210"));
        assert_eq!(extract_phone("123456789"), None);
        assert_eq!(extract_phone("12-34-56-"), None);
    }

    #[test]
    fn guess_name_picks_first_short_title_cased_line() {
        let lines = [
            "Jane Doe",
            "Senior Data Scientist",
            "jane.doe@example.com | +1 (555) 123-4567",
        ];
        assert_eq!(guess_name(&lines), "Jane Doe");
    }

    #[test]
    fn guess_name_skips_contact_lines() {
        let lines = ["+1 555 123 4567", "Email: Jane@Example.com", "Jane Doe"];
        assert_eq!(guess_name(&lines), "Jane Doe");
    }

    #[test]
    fn guess_name_skips_lines_with_too_many_capitalized_words() {
        let lines = [
            "Curriculum Vitae Of The Applicant Below",
            "O'Neil Smith-Jones",
        ];
        assert_eq!(guess_name(&lines), "O'Neil Smith-Jones");
    }

    #[test]
    fn guess_name_falls_back_to_first_line() {
        let lines = ["  lowercase heading only  ", "another one"];
        assert_eq!(guess_name(&lines), "lowercase heading only");
    }

    #[test]
    fn guess_name_of_empty_input_is_empty() {
        let lines: [&str; 0] = [];
        assert_eq!(guess_name(&lines), "");
    }

    #[test]
    fn segment_sections_buckets_lines_under_their_heading() {
        let lines = [
            "Skills",
            "Python, AWS, Lambda, DynamoDB",
            "Projects",
            "Serverless Resume Parser",
        ];
        let buckets = segment_sections(&lines);
        assert_eq!(buckets.skills, vec!["Python, AWS, Lambda, DynamoDB"]);
        assert_eq!(buckets.projects, vec!["Serverless Resume Parser"]);
        assert!(buckets.education.is_empty());
    }

    #[test]
    fn segment_sections_drops_lines_before_first_heading_and_under_summary() {
        let lines = [
            "Jane Doe",
            "Summary",
            "Data scientist with a passion for clean pipelines",
            "Education",
            "MSc Statistics",
        ];
        let buckets = segment_sections(&lines);
        assert_eq!(buckets.education, vec!["MSc Statistics"]);
        assert!(buckets.skills.is_empty());
        assert!(buckets.projects.is_empty());
        assert!(buckets.experience.is_empty());
        assert!(buckets.certifications.is_empty());
    }

    #[test]
    fn segment_sections_keeps_long_keyword_lines_in_current_section() {
        let long_line = "Built projects that improved experience for 2M users";
        assert!(!is_section_heading(long_line));

        let lines = ["Experience", "Company ABC - Software Engineer", long_line];
        let buckets = segment_sections(&lines);
        assert_eq!(
            buckets.experience,
            vec!["Company ABC - Software Engineer", long_line]
        );
        assert!(buckets.projects.is_empty());
    }

    #[test]
    fn segment_sections_routes_achievements_to_certifications() {
        let lines = ["Achievements", "Hackathon winner 2022"];
        let buckets = segment_sections(&lines);
        assert_eq!(buckets.certifications, vec!["Hackathon winner 2022"]);
    }

    #[test]
    fn parse_resume_lines_minimal_contact() {
        let lines = [
            "Jane Doe",
            "Senior Data Scientist",
            "jane.doe@example.com | +1 (555) 123-4567",
        ];
        let parsed = parse_resume_lines(&lines);
        assert_eq!(parsed.name, "Jane Doe");
        assert_eq!(parsed.email, "jane.doe@example.com");
        assert!(parsed.phone.contains("555"));
    }

    #[test]
    fn parse_resume_lines_full_resume() {
        let lines = [
            "AMIT KUMAR",
            "Email: amitksamit@gmail.com",
            "Phone: 555-987-6543",
            "Skills",
            "Python, AWS, Lambda, DynamoDB",
            "Projects",
            "Serverless Resume Parser",
            "Experience",
            "Company ABC - Software Engineer",
            "Education",
            "BSc Computer Science - XYZ University",
            "Certifications",
            "AWS Certified Developer - Associate",
        ];
        let parsed = parse_resume_lines(&lines);

        assert_eq!(parsed.name, "AMIT KUMAR");
        assert_eq!(parsed.email, "amitksamit@gmail.com");
        assert_eq!(parsed.phone, "555-987-6543");
        assert!(parsed.skills.iter().any(|l| l.contains("Python")));
        assert!(!parsed.skills.iter().any(|l| l.contains("Resume")));
        assert!(parsed.projects.iter().any(|l| l.contains("Resume")));
        assert!(!parsed.projects.iter().any(|l| l.contains("Python")));
        assert!(parsed.experience.iter().any(|l| l.contains("Company ABC")));
        assert!(parsed.education.iter().any(|l| l.contains("University")));
        assert!(parsed
            .certifications
            .iter()
            .any(|l| l.contains("AWS Certified")));
    }

    #[test]
    fn parse_resume_lines_of_empty_input_is_empty() {
        let lines: Vec<String> = Vec::new();
        let parsed = parse_resume_lines(&lines);
        assert_eq!(parsed, ParsedResume::default());
    }

    #[test]
    fn parse_resume_lines_is_idempotent() {
        let lines = ["Jane Doe", "Skills", "Rust", "Education", "BSc"];
        assert_eq!(parse_resume_lines(&lines), parse_resume_lines(&lines));
    }
}
