//! The sexagenary (干支) year a couplet is written for.
//!
//! Couplets are pasted for the coming Spring Festival, so a run in
//! December 2025 writes for 2026 (丙午, year of the horse). The festival
//! falls in late January or February; from March on the next festival is
//! the one a year ahead.
//!
//! ```rust
//! use chunlian_types::fragments::LunarYear;
//!
//! assert_eq!(LunarYear::new(2026).to_string(), "2026丙午马年");
//! ```

use std::fmt::Display;

use chrono::Datelike as _;

const STEMS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];
const BRANCHES: [char; 12] = ['子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥'];
const ZODIAC: [char; 12] = ['鼠', '牛', '虎', '兔', '龙', '蛇', '马', '羊', '猴', '鸡', '狗', '猪'];

/// Last month (inclusive) in which the current year's festival is still the
/// relevant one.
const FESTIVAL_SEASON_END_MONTH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarYear {
    year: i32,
}

impl LunarYear {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    /// The festival year relevant at the current UTC date.
    pub fn upcoming() -> Self {
        Self::upcoming_from(chrono::Utc::now().date_naive())
    }

    pub fn upcoming_from(date: chrono::NaiveDate) -> Self {
        if date.month() <= FESTIVAL_SEASON_END_MONTH {
            Self::new(date.year())
        } else {
            Self::new(date.year() + 1)
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    fn cycle_index(&self) -> usize {
        // 4 CE was a 甲子 year.
        (self.year - 4).rem_euclid(60) as usize
    }

    /// 干支 name, e.g. `丙午`.
    pub fn stem_branch(&self) -> String {
        let i = self.cycle_index();
        [STEMS[i % 10], BRANCHES[i % 12]].iter().collect()
    }

    /// Zodiac animal, e.g. `马`.
    pub fn zodiac(&self) -> char {
        ZODIAC[self.cycle_index() % 12]
    }
}

impl Display for LunarYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}年", self.year, self.stem_branch(), self.zodiac())
    }
}
