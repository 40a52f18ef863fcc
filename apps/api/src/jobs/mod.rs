// Job postings and applications. Listing is public; posting, editing and
// reviewing applicants are employer-only, applying is job-seeker-only.

pub mod applications;
pub mod handlers;
