//! 集成测试共用的业务类型

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rule_engine::{Describe, Inspect, PropertyKind, PropertyValue, Shape};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct Response {
    pub answer: i32,
    pub comment: Option<String>,
}

impl Inspect for Response {
    fn shape(&self) -> Shape {
        Self::describe()
    }

    fn read(&self, slot: usize) -> PropertyValue<'_> {
        match slot {
            0 => self.answer.to_value(),
            1 => self.comment.to_value(),
            _ => PropertyValue::Null,
        }
    }
}

impl Describe for Response {
    fn describe() -> Shape {
        Shape::new("Response")
            .property::<i32>("Answer")
            .property::<Option<String>>("Comment")
    }
}

pub struct Survey {
    pub id: Uuid,
    pub name: String,
    pub nickname: Option<String>,
    pub response: Option<Response>,
    pub subscribed: Option<bool>,
    pub active: bool,
    pub score: Option<f64>,
    pub price: Decimal,
    pub submitted_at: DateTime<Utc>,
    pub birthday: Option<NaiveDate>,
    pub visits: u32,
}

impl Inspect for Survey {
    fn shape(&self) -> Shape {
        Self::describe()
    }

    fn read(&self, slot: usize) -> PropertyValue<'_> {
        match slot {
            0 => self.id.to_value(),
            1 => self.name.to_value(),
            2 => self.nickname.to_value(),
            3 => PropertyValue::optional_object(self.response.as_ref()),
            4 => self.subscribed.to_value(),
            5 => self.active.to_value(),
            6 => self.score.to_value(),
            7 => self.price.to_value(),
            8 => self.submitted_at.to_value(),
            9 => self.birthday.to_value(),
            10 => self.visits.to_value(),
            _ => PropertyValue::Null,
        }
    }
}

impl Describe for Survey {
    fn describe() -> Shape {
        Shape::new("Survey")
            .property::<Uuid>("Id")
            .property::<String>("Name")
            .property::<Option<String>>("Nickname")
            .optional_object::<Response>("Response")
            .property::<Option<bool>>("Subscribed")
            .property::<bool>("Active")
            .property::<Option<f64>>("Score")
            .property::<Decimal>("Price")
            .property::<DateTime<Utc>>("SubmittedAt")
            .property::<Option<NaiveDate>>("Birthday")
            .property::<u32>("Visits")
            .write_only::<String>("Password")
    }
}

/// 只有一个整数属性的对象
pub struct TestObject {
    pub test_value: i32,
}

impl Inspect for TestObject {
    fn shape(&self) -> Shape {
        Self::describe()
    }

    fn read(&self, slot: usize) -> PropertyValue<'_> {
        match slot {
            0 => self.test_value.to_value(),
            _ => PropertyValue::Null,
        }
    }
}

impl Describe for TestObject {
    fn describe() -> Shape {
        Shape::new("TestObject").property::<i32>("TestValue")
    }
}

pub const SURVEY_ID: &str = "6f1c2a8e-7d3b-4c4e-9a51-2b0e8f4d9c17";

pub fn survey() -> Survey {
    Survey {
        id: Uuid::parse_str(SURVEY_ID).unwrap(),
        name: "Steve".to_string(),
        nickname: None,
        response: Some(Response {
            answer: 42,
            comment: Some("Forty Two".to_string()),
        }),
        subscribed: None,
        active: true,
        score: Some(7.5),
        price: Decimal::new(1999, 2),
        submitted_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        birthday: NaiveDate::from_ymd_opt(1990, 6, 1),
        visits: 3,
    }
}
