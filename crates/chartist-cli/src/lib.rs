//! 차트 분석 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - CSV/JSON 바 파일 로딩
//! - 분석 실행과 결과 출력 (JSON, 요약)
//! - 패턴 카탈로그 조회

pub mod commands;
