//! Common test utilities for provisioning tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axl_client::{field_str, AdminApi, AxlError, ObjectKind, Record};
use mockall::mock;
use provisioning::{DeviceType, LineKey, MobilityUser, PhoneSpec};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

mock! {
    pub Api {}

    #[async_trait]
    impl AdminApi for Api {
        async fn get(&self, kind: ObjectKind, criteria: Record) -> Result<Record, AxlError>;
        async fn add(&self, kind: ObjectKind, record: Record) -> Result<String, AxlError>;
        async fn update(&self, kind: ObjectKind, record: Record) -> Result<String, AxlError>;
        async fn remove(&self, kind: ObjectKind, criteria: Record) -> Result<String, AxlError>;
    }
}

/// In-memory server holding objects by natural key.
#[derive(Default)]
pub struct FakeUcm {
    objects: Mutex<HashMap<(ObjectKind, String), Record>>,
    next_uuid: AtomicUsize,
    mutations: AtomicUsize,
}

fn key_fields(kind: ObjectKind) -> &'static [&'static str] {
    match kind {
        ObjectKind::User => &["userid"],
        ObjectKind::Line => &["pattern", "routePartitionName"],
        ObjectKind::RemoteDestination => &["destination"],
        ObjectKind::Phone | ObjectKind::RemoteDestinationProfile => &["name"],
    }
}

fn natural_key(kind: ObjectKind, record: &Record) -> (ObjectKind, String) {
    let key = key_fields(kind)
        .iter()
        .map(|field| field_str(record, field).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("/");
    (kind, key)
}

impl FakeUcm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object as if created out of band.
    pub fn insert(&self, kind: ObjectKind, record: Record) {
        let key = natural_key(kind, &record);
        self.objects.lock().unwrap().insert(key, record);
    }

    pub fn object(&self, kind: ObjectKind, criteria: &Record) -> Option<Record> {
        self.objects
            .lock()
            .unwrap()
            .get(&natural_key(kind, criteria))
            .cloned()
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Adds, updates and removes that reached the server.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn uuid(&self) -> String {
        format!("{{{:08}}}", self.next_uuid.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl AdminApi for FakeUcm {
    async fn get(&self, kind: ObjectKind, criteria: Record) -> Result<Record, AxlError> {
        self.object(kind, &criteria)
            .ok_or_else(|| AxlError::not_found(kind.type_name()))
    }

    async fn add(&self, kind: ObjectKind, record: Record) -> Result<String, AxlError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let key = natural_key(kind, &record);
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(AxlError::Fault {
                code: Some(4052),
                message: format!("Duplicate {}", kind),
            });
        }
        objects.insert(key, record);
        Ok(self.uuid())
    }

    async fn update(&self, kind: ObjectKind, record: Record) -> Result<String, AxlError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let key = natural_key(kind, &record);
        let mut objects = self.objects.lock().unwrap();
        match objects.get_mut(&key) {
            Some(existing) => {
                existing.extend(record);
                Ok(self.uuid())
            }
            None => Err(AxlError::not_found(kind.type_name())),
        }
    }

    async fn remove(&self, kind: ObjectKind, criteria: Record) -> Result<String, AxlError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        match self.objects.lock().unwrap().remove(&natural_key(kind, &criteria)) {
            Some(_) => Ok(self.uuid()),
            None => Err(AxlError::not_found(kind.type_name())),
        }
    }
}

pub fn jane_phone(device_type: DeviceType) -> PhoneSpec {
    PhoneSpec {
        username: "jdoe".into(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        device_type,
        line: LineKey::new("5551212", "Internal PAR"),
        extension: "1212".into(),
        device_pool: "DP-Chicago".into(),
        calling_search_space: "CSS-Chicago".into(),
    }
}

pub fn jane_mobility() -> MobilityUser {
    MobilityUser {
        userid: "jdoe".into(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        pattern: "+13125551212".into(),
        extension: "1212".into(),
        did: "3125551212".into(),
        device_pool: "DP-Chicago".into(),
        calling_search_space: "CSS-Chicago".into(),
        device_type: DeviceType::Csf,
        mobile: Some("13125550100".into()),
        forward_css: Some("CSS-Forward".into()),
        line_css: None,
    }
}
