//! 차트 분석 코어의 에러 타입.
//!
//! 이 모듈은 분석 계산이 시작되기 전에 발생하는 치명적 에러를 정의합니다.
//! 지표별 데이터 부족 같은 부분 실패는 `chartist-analytics`에서 따로 다룹니다.

use thiserror::Error;

/// 코어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 바 시리즈 불변식 위반 (타임스탬프 순서, OHLC 관계 등)
    #[error("잘못된 바 시리즈: {0}")]
    InvalidSeries(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 코어 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// 분석 전체를 중단시키는 치명적 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::InvalidSeries(_) | CoreError::InvalidInput(_))
    }

    /// UI/리포트 협력자가 사용하는 분류 코드를 반환합니다.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidSeries(_) => "InvalidSeries",
            CoreError::InvalidInput(_) => "InvalidInput",
            CoreError::Config(_) => "Config",
            CoreError::Serialization(_) => "Serialization",
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
