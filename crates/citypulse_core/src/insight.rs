//! Triage insights: severity, weather, community impact and crew routing.
//!
//! None of these are backed by a model or an external service. Each is a
//! trait with a `Fake*` implementation that waits for a configured latency
//! and then returns random values in fixed ranges. The rule-based helpers
//! derived from those values (`weather_alerts`, `maintenance_impact`,
//! `impact_level`) are deterministic.

use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::schema::{Category, Issue};

/// Placeholder the report form shows before a location is picked.
pub const NO_LOCATION: &str = "No location set";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Critical => 1,
            Severity::High => 2,
            Severity::Medium => 3,
            Severity::Low => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityPrediction {
    pub severity: Severity,
    pub confidence: u8,
    pub priority: u8,
}

pub trait SeverityPredictor {
    fn predict(&mut self, issue: &Issue) -> SeverityPrediction;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
}

const CONDITIONS: [Condition; 4] = [
    Condition::Sunny,
    Condition::Cloudy,
    Condition::Rainy,
    Condition::Stormy,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub day: String,
    pub temp: i32,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub temperature: i32,
    pub condition: Condition,
    pub humidity: u32,
    pub wind_speed: u32,
    pub precipitation: u32,
    pub visibility: u32,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherAlert {
    pub kind: AlertKind,
    pub message: &'static str,
}

pub trait WeatherProvider {
    /// `None` when no usable location was given.
    fn current(&mut self, location: &str) -> Option<Weather>;
}

pub fn weather_alerts(weather: &Weather) -> Vec<WeatherAlert> {
    let mut alerts = Vec::new();
    if weather.condition == Condition::Stormy {
        alerts.push(WeatherAlert {
            kind: AlertKind::Warning,
            message: "Storm conditions may delay maintenance work",
        });
    }
    if weather.precipitation > 80 {
        alerts.push(WeatherAlert {
            kind: AlertKind::Info,
            message: "Heavy rain expected - drainage issues may worsen",
        });
    }
    if weather.wind_speed > 15 {
        alerts.push(WeatherAlert {
            kind: AlertKind::Warning,
            message: "High winds may affect outdoor maintenance",
        });
    }
    if weather.temperature > 30 {
        alerts.push(WeatherAlert {
            kind: AlertKind::Info,
            message: "High temperatures - consider worker safety",
        });
    }
    alerts
}

pub fn maintenance_impact(weather: &Weather) -> Vec<&'static str> {
    let mut impacts = Vec::new();
    if matches!(weather.condition, Condition::Rainy | Condition::Stormy) {
        impacts.extend([
            "Road work may be delayed",
            "Outdoor electrical work suspended",
            "Drainage issues may worsen",
        ]);
    }
    if weather.wind_speed > 15 {
        impacts.extend(["Tree trimming work suspended", "High-altitude work restricted"]);
    }
    if weather.temperature > 30 {
        impacts.extend(["Worker breaks increased", "Hydration protocols active"]);
    }
    if weather.visibility < 10 {
        impacts.extend(["Traffic control enhanced", "Safety measures increased"]);
    }
    if impacts.is_empty() {
        impacts.push("Weather conditions suitable for all maintenance work");
    }
    impacts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityImpact {
    pub population_density: u32,
    pub affected_radius_km: f64,
    pub nearby_schools: u32,
    pub nearby_hospitals: u32,
    pub public_transport_routes: u32,
    pub community_engagement: u32,
    pub estimated_affected: u32,
    pub priority_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
    Unknown,
}

pub fn impact_level(score: u32) -> ImpactLevel {
    if score == 0 {
        ImpactLevel::Unknown
    } else if score >= 80 {
        ImpactLevel::High
    } else if score >= 60 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    }
}

pub trait ImpactEstimator {
    /// `None` unless both a location and a category are known.
    fn estimate(&mut self, location: &str, category: Option<Category>) -> Option<CommunityImpact>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrewType {
    General,
    Roads,
    Water,
    Electrical,
}

impl CrewType {
    pub fn name(&self) -> &'static str {
        match self {
            CrewType::General => "General Maintenance",
            CrewType::Roads => "Roads & Transport",
            CrewType::Water => "Water & Drainage",
            CrewType::Electrical => "Electrical",
        }
    }
}

impl FromStr for CrewType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "general" => Ok(CrewType::General),
            "roads" => Ok(CrewType::Roads),
            "water" => Ok(CrewType::Water),
            "electrical" => Ok(CrewType::Electrical),
            other => Err(anyhow!("Unknown crew type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub issue_id: String,
    pub order: usize,
    pub estimated_duration_hours: u32,
    pub priority: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSavings {
    pub time_saved_hours: u32,
    pub fuel_saved_litres: u32,
    pub efficiency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    pub crew: CrewType,
    pub total_distance_km: u32,
    pub estimated_time_hours: u32,
    pub fuel_efficiency: u32,
    pub stops: Vec<RouteStop>,
    pub optimization: RouteSavings,
}

pub trait RouteOptimizer {
    /// Needs at least two stops.
    fn optimize(&mut self, stops: &[&Issue], crew: CrewType) -> Result<OptimizedRoute>;
}

/// Randomness plus an artificial delay, shared by the fakes.
#[derive(Debug, Clone)]
struct Simulated {
    rng: StdRng,
    latency: Duration,
}

impl Simulated {
    fn new(latency: Duration) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            latency,
        }
    }

    fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            latency: Duration::ZERO,
        }
    }

    fn wait(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }

    /// Uniform integer in `base..base + span`.
    fn pick(&mut self, base: u32, span: u32) -> u32 {
        base + self.rng.random_range(0..span)
    }
}

macro_rules! fake_constructors {
    ($name:ident) => {
        impl $name {
            pub fn new(latency: Duration) -> Self {
                Self(Simulated::new(latency))
            }

            /// Deterministic and without delay.
            pub fn seeded(seed: u64) -> Self {
                Self(Simulated::seeded(seed))
            }
        }
    };
}

/// Random severity, no analysis performed.
#[derive(Debug, Clone)]
pub struct FakeSeverityPredictor(Simulated);
fake_constructors!(FakeSeverityPredictor);

impl SeverityPredictor for FakeSeverityPredictor {
    fn predict(&mut self, issue: &Issue) -> SeverityPrediction {
        self.0.wait();
        let rng = &mut self.0.rng;
        let severity = if rng.random::<f64>() > 0.7 {
            Severity::Critical
        } else if rng.random::<f64>() > 0.5 {
            Severity::High
        } else if rng.random::<f64>() > 0.3 {
            Severity::Medium
        } else {
            Severity::Low
        };
        let confidence = self.0.pick(70, 30) as u8;
        debug!(issue = %issue.id, %severity, confidence, "simulated severity");
        SeverityPrediction {
            severity,
            confidence,
            priority: severity.priority(),
        }
    }
}

/// Random readings, no weather service queried.
#[derive(Debug, Clone)]
pub struct FakeWeatherProvider(Simulated);
fake_constructors!(FakeWeatherProvider);

impl WeatherProvider for FakeWeatherProvider {
    fn current(&mut self, location: &str) -> Option<Weather> {
        if location.trim().is_empty() || location == NO_LOCATION {
            return None;
        }
        self.0.wait();
        let sim = &mut self.0;
        let temperature = sim.pick(5, 30) as i32;
        let condition = CONDITIONS[sim.pick(0, 4) as usize];
        let humidity = sim.pick(40, 40);
        let wind_speed = sim.pick(5, 20);
        let precipitation = sim.pick(0, 100);
        let visibility = sim.pick(5, 20);
        let forecast = [
            ("Today", Condition::Sunny),
            ("Tomorrow", Condition::Rainy),
            ("Day 3", Condition::Cloudy),
        ]
        .into_iter()
        .map(|(day, condition)| ForecastDay {
            day: day.to_string(),
            temp: sim.pick(5, 30) as i32,
            condition,
        })
        .collect();
        Some(Weather {
            temperature,
            condition,
            humidity,
            wind_speed,
            precipitation,
            visibility,
            forecast,
        })
    }
}

/// Random neighbourhood figures, no census data consulted.
#[derive(Debug, Clone)]
pub struct FakeImpactEstimator(Simulated);
fake_constructors!(FakeImpactEstimator);

impl ImpactEstimator for FakeImpactEstimator {
    fn estimate(&mut self, location: &str, category: Option<Category>) -> Option<CommunityImpact> {
        if location.trim().is_empty() || location == NO_LOCATION {
            return None;
        }
        category?;
        self.0.wait();
        let sim = &mut self.0;
        Some(CommunityImpact {
            population_density: sim.pick(1000, 5000),
            affected_radius_km: f64::from(sim.pick(0, 2)) + 0.5,
            nearby_schools: sim.pick(1, 5),
            nearby_hospitals: sim.pick(0, 3),
            public_transport_routes: sim.pick(2, 8),
            community_engagement: sim.pick(60, 40),
            estimated_affected: sim.pick(100, 500),
            priority_score: sim.pick(70, 30),
        })
    }
}

/// Keeps the selection order and invents the totals.
#[derive(Debug, Clone)]
pub struct FakeRouteOptimizer(Simulated);
fake_constructors!(FakeRouteOptimizer);

impl RouteOptimizer for FakeRouteOptimizer {
    fn optimize(&mut self, stops: &[&Issue], crew: CrewType) -> Result<OptimizedRoute> {
        if stops.len() < 2 {
            return Err(anyhow!("Select at least two issues to plan a route"));
        }
        self.0.wait();
        let sim = &mut self.0;
        let total_distance_km = sim.pick(20, 50);
        let estimated_time_hours = sim.pick(4, 8);
        let fuel_efficiency = sim.pick(80, 20);
        let stops = stops
            .iter()
            .enumerate()
            .map(|(index, issue)| RouteStop {
                issue_id: issue.id.clone(),
                order: index + 1,
                estimated_duration_hours: sim.pick(1, 2),
                priority: Severity::Medium,
            })
            .collect();
        Ok(OptimizedRoute {
            crew,
            total_distance_km,
            estimated_time_hours,
            fuel_efficiency,
            stops,
            optimization: RouteSavings {
                time_saved_hours: sim.pick(1, 3),
                fuel_saved_litres: sim.pick(2, 5),
                efficiency: sim.pick(85, 15),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IssueStatus, SocialMediaPosts};

    fn issue(id: &str) -> Issue {
        Issue {
            id: id.to_string(),
            description: "Fallen tree blocking lane".to_string(),
            category: Category::EnvironmentParks,
            subcategory: "Unauthorized tree cutting".to_string(),
            municipal_corp: "Nagpur Municipal Corporation".to_string(),
            municipal_code: "100126".to_string(),
            area: "Sitabuldi".to_string(),
            address: None,
            coordinates: None,
            media_urls: Vec::new(),
            status: IssueStatus::Pending,
            admin_notes: None,
            created_at: "2024-06-01T00:00:00Z".to_string(),
            updated_at: "2024-06-01T00:00:00Z".to_string(),
            upvotes: 0,
            comments: Vec::new(),
            escalated: false,
            escalated_at: None,
            social_media_posts: SocialMediaPosts::default(),
            user_id: "u1".to_string(),
            user_name: "Asha".to_string(),
            user_email: "asha@example.com".to_string(),
        }
    }

    fn weather(
        condition: Condition,
        temperature: i32,
        wind: u32,
        rain: u32,
        visibility: u32,
    ) -> Weather {
        Weather {
            temperature,
            condition,
            humidity: 50,
            wind_speed: wind,
            precipitation: rain,
            visibility,
            forecast: Vec::new(),
        }
    }

    #[test]
    fn severity_prediction_stays_in_range() {
        let mut predictor = FakeSeverityPredictor::seeded(7);
        for _ in 0..200 {
            let prediction = predictor.predict(&issue("a"));
            assert!((70..=99).contains(&prediction.confidence));
            assert_eq!(prediction.priority, prediction.severity.priority());
        }
    }

    #[test]
    fn seeded_fakes_are_reproducible() {
        let first = FakeWeatherProvider::seeded(42).current("Pune").unwrap();
        let second = FakeWeatherProvider::seeded(42).current("Pune").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn weather_readings_stay_in_range() {
        let mut provider = FakeWeatherProvider::seeded(3);
        assert!(provider.current(NO_LOCATION).is_none());
        assert!(provider.current("  ").is_none());
        for _ in 0..100 {
            let w = provider.current("Pune").unwrap();
            assert!((5..35).contains(&w.temperature));
            assert!((40..80).contains(&w.humidity));
            assert!((5..25).contains(&w.wind_speed));
            assert!(w.precipitation < 100);
            assert!((5..25).contains(&w.visibility));
            assert_eq!(w.forecast.len(), 3);
            assert_eq!(w.forecast[1].condition, Condition::Rainy);
        }
    }

    #[test]
    fn alerts_follow_thresholds() {
        assert!(weather_alerts(&weather(Condition::Sunny, 25, 10, 20, 15)).is_empty());
        let alerts = weather_alerts(&weather(Condition::Stormy, 31, 16, 81, 15));
        let messages: Vec<&str> = alerts.iter().map(|alert| alert.message).collect();
        assert_eq!(
            messages,
            vec![
                "Storm conditions may delay maintenance work",
                "Heavy rain expected - drainage issues may worsen",
                "High winds may affect outdoor maintenance",
                "High temperatures - consider worker safety",
            ]
        );
        assert_eq!(alerts[0].kind, AlertKind::Warning);
    }

    #[test]
    fn maintenance_impact_defaults_to_suitable() {
        assert_eq!(
            maintenance_impact(&weather(Condition::Cloudy, 20, 5, 0, 20)),
            vec!["Weather conditions suitable for all maintenance work"]
        );
        let impacts = maintenance_impact(&weather(Condition::Rainy, 20, 5, 90, 6));
        assert_eq!(impacts.len(), 5);
        assert!(impacts.contains(&"Traffic control enhanced"));
    }

    #[test]
    fn impact_levels() {
        assert_eq!(impact_level(0), ImpactLevel::Unknown);
        assert_eq!(impact_level(85), ImpactLevel::High);
        assert_eq!(impact_level(80), ImpactLevel::High);
        assert_eq!(impact_level(79), ImpactLevel::Medium);
        assert_eq!(impact_level(59), ImpactLevel::Low);
    }

    #[test]
    fn impact_needs_location_and_category() {
        let mut estimator = FakeImpactEstimator::seeded(1);
        assert!(estimator.estimate("Pune", None).is_none());
        assert!(estimator.estimate(NO_LOCATION, Some(Category::WasteManagement)).is_none());
        let impact = estimator.estimate("Pune", Some(Category::WasteManagement)).unwrap();
        assert!((70..100).contains(&impact.priority_score));
        assert!(impact.affected_radius_km == 0.5 || impact.affected_radius_km == 1.5);
    }

    #[test]
    fn route_requires_two_stops_and_keeps_order() {
        let mut optimizer = FakeRouteOptimizer::seeded(9);
        let a = issue("a");
        let b = issue("b");
        let c = issue("c");
        assert!(optimizer.optimize(&[&a], CrewType::General).is_err());

        let route = optimizer.optimize(&[&c, &a, &b], CrewType::Roads).unwrap();
        let order: Vec<(&str, usize)> = route
            .stops
            .iter()
            .map(|stop| (stop.issue_id.as_str(), stop.order))
            .collect();
        assert_eq!(order, vec![("c", 1), ("a", 2), ("b", 3)]);
        assert!((20..70).contains(&route.total_distance_km));
        assert_eq!(route.crew, CrewType::Roads);
        assert_eq!("water".parse::<CrewType>().unwrap(), CrewType::Water);
    }
}
