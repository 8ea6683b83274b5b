use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum JobType {
        FullTime => "Full Time",
        PartTime => "Part Time",
        Internship => "Internship",
    }
}

text_enum! {
    pub enum Education {
        HigherSecondary => "Higher Secondary",
        Bachelors => "Bachelors",
        Master => "Master",
        Phd => "Phd",
    }
}

text_enum! {
    pub enum ExperienceLevel {
        Fresher => "Fresher",
        OneYear => "1 Year",
        TwoYears => "2 Years",
        ThreeYearsPlus => "3 Years above",
    }
}

text_enum! {
    pub enum ItIndustry {
        SoftwareDeveloper => "Software Developer",
        WebDeveloper => "Web Developer",
        MobileAppDeveloper => "Mobile App Developer",
        GameDeveloper => "Game Developer",
        EmbeddedSystemsDeveloper => "Embedded Systems Developer",
        DevopsEngineer => "DevOps Engineer",
        QualityAssuranceEngineer => "Quality Assurance Engineer",
        TestAutomationEngineer => "Test Automation Engineer",
        FrontendDeveloper => "Frontend Developer",
        BackendDeveloper => "Backend Developer",
        FullStackDeveloper => "Full Stack Developer",
        DatabaseDeveloper => "Database Developer",
        CloudEngineer => "Cloud Engineer",
        SystemsEngineer => "Systems Engineer",
        UiUxDesigner => "UI/UX Designer",
        SoftwareArchitect => "Software Architect",
        MachineLearningEngineer => "Machine Learning Engineer",
        AiDeveloper => "AI Developer",
        RoboticsEngineer => "Robotics Engineer",
        BlockchainDeveloper => "Blockchain Developer",
        ArVrDeveloper => "AR/VR Developer",
        IotDeveloper => "IoT Developer",
        FirmwareEngineer => "Firmware Engineer",
        SecurityEngineer => "Security Engineer",
        EtlDeveloper => "ETL Developer",
        BusinessIntelligenceDeveloper => "BI Developer",
        NlpEngineer => "NLP Engineer",
        DataScientist => "Data Scientist",
        DataAnalyst => "Data Analyst",
        BigDataEngineer => "Big Data Engineer",
        DataArchitect => "Data Architect",
        StatisticalAnalyst => "Statistical Analyst",
        PredictiveModeler => "Predictive Modeling Analyst",
        DeepLearningEngineer => "Deep Learning Engineer",
        ComputerVisionEngineer => "Computer Vision Engineer",
        QuantitativeAnalyst => "Quantitative Analyst",
        DataVisualizationEngineer => "Data Visualization Engineer",
        ResearchScientist => "Research Scientist (Data Science)",
        DataMiningEngineer => "Data Mining Engineer",
        ComputationalLinguist => "Computational Linguist",
        AnalyticsEngineer => "Analytics Engineer",
    }
}

impl Default for JobType {
    fn default() -> Self {
        JobType::FullTime
    }
}

impl Default for Education {
    fn default() -> Self {
        Education::Bachelors
    }
}

impl Default for ExperienceLevel {
    fn default() -> Self {
        ExperienceLevel::Fresher
    }
}

impl Default for ItIndustry {
    fn default() -> Self {
        ItIndustry::FrontendDeveloper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub job_type: JobType,
    pub education: Education,
    pub it_industry: ItIndustry,
    pub experience: ExperienceLevel,
    pub salary: i32,
    pub positions: i32,
    pub last_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// A job whose last date has passed is gone for every reader, whether or
    /// not the row has been reaped yet.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.last_date < now
    }

    pub fn is_listed(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }
}
