//! 지표 저장소.
//!
//! 카테고리별 최신 값 보관. 카테고리마다 별도 잠금을 둬서
//! 서로 다른 소스의 기록이 경합하지 않는다.

use parking_lot::Mutex;
use perfwatch_core::error::CoreError;
use perfwatch_core::models::metrics::{MetricCategory, MetricValue, ResourceRecord, ValueShape};
use std::collections::BTreeMap;

/// 카테고리 → 값 저장소 (세션 동안만 유지, 영속화 없음)
pub struct MetricsStore {
    slots: [Mutex<Option<MetricValue>>; MetricCategory::COUNT],
}

impl MetricsStore {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Mutex::new(None)),
        }
    }

    fn slot(&self, category: MetricCategory) -> &Mutex<Option<MetricValue>> {
        &self.slots[category.index()]
    }

    /// 레코드/스칼라 카테고리 값 덮어쓰기
    pub fn set(&self, category: MetricCategory, value: MetricValue) -> Result<(), CoreError> {
        if category.shape() == ValueShape::Sequence {
            return Err(shape_error(category, "시퀀스 카테고리는 append로만 기록합니다"));
        }
        if value.category() != category {
            return Err(shape_error(
                category,
                &format!("{} 값은 기록할 수 없습니다", value.category()),
            ));
        }

        *self.slot(category).lock() = Some(value);
        Ok(())
    }

    /// 시퀀스 카테고리에 레코드 추가 (도착 순서 유지)
    pub fn append(
        &self,
        category: MetricCategory,
        records: Vec<ResourceRecord>,
    ) -> Result<(), CoreError> {
        if category.shape() != ValueShape::Sequence {
            return Err(shape_error(category, "레코드 카테고리는 set으로만 기록합니다"));
        }

        let mut slot = self.slot(category).lock();
        match slot.as_mut() {
            Some(MetricValue::Resources(existing)) => existing.extend(records),
            _ => *slot = Some(MetricValue::Resources(records)),
        }
        Ok(())
    }

    /// 카테고리 값 조회 (복사본)
    pub fn get(&self, category: MetricCategory) -> Option<MetricValue> {
        self.slot(category).lock().clone()
    }

    /// 값이 있는 카테고리 전체 스냅샷 (카테고리 순)
    pub fn snapshot_all(&self) -> BTreeMap<MetricCategory, MetricValue> {
        MetricCategory::ALL
            .into_iter()
            .filter_map(|category| self.get(category).map(|value| (category, value)))
            .collect()
    }

    /// 값이 있는 카테고리 수
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

fn shape_error(category: MetricCategory, message: &str) -> CoreError {
    CoreError::Validation {
        field: category.as_str().to_string(),
        message: message.to_string(),
    }
}
