//! 정밀한 가격 계산을 위한 Decimal 유틸리티.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 가격 타입.
pub type Price = Decimal;

/// 거래량 타입.
pub type Volume = Decimal;

/// 퍼센트 타입 (1.0 = 1%).
pub type Percentage = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 제곱근을 계산합니다. 0 이하의 값은 0을 반환합니다.
    fn sqrt_newton(&self) -> Decimal;

    /// `base` 대비 변화율(%)을 계산합니다. `base`가 0이면 `None`.
    fn pct_change_from(&self, base: Decimal) -> Option<Percentage>;

    /// 지정된 소수점 자릿수로 반올림합니다 (0.5는 0에서 멀어지는 방향).
    fn round_half_up(&self, dp: u32) -> Decimal;
}

impl DecimalExt for Decimal {
    fn sqrt_newton(&self) -> Decimal {
        if *self <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        // f64 근사값에서 시작하면 몇 번의 반복으로 Decimal 정밀도에 도달한다
        let mut x = self
            .to_f64()
            .map(f64::sqrt)
            .and_then(Decimal::from_f64)
            .filter(|x| *x > Decimal::ZERO)
            .unwrap_or(*self);
        let two = dec!(2);

        for _ in 0..6 {
            let next = (x + *self / x) / two;
            if next == x {
                break;
            }
            x = next;
        }

        x
    }

    fn pct_change_from(&self, base: Decimal) -> Option<Percentage> {
        if base.is_zero() {
            return None;
        }
        Some((*self - base) / base * dec!(100))
    }

    fn round_half_up(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    }
}
