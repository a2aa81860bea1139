pub mod cv_data;
pub mod response;

pub use cv_data::{
    Address, CvData, CvPayload, Education, Experience, PersonalInfo, Project, Record,
    RecordSummary, Skill, Theme,
};
