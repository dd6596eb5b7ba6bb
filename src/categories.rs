//! Stat categories: where each table lives, how its columns map, and how
//! its rows are typed and keyed.

use crate::constants::season_url;
use crate::error::ScraperError;
use crate::parser::ColumnMap;
use crate::schema::{
    count, date, decimal, int, pct, rate, season, text, ColumnDef, ColumnKind, TableSchema,
};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    TeamOffense,
    TeamDefense,
    Standings,
    Games,
    Kicking,
    Punting,
    Returns,
    PassingStats,
    RushingStats,
    ReceivingStats,
    DefenseStats,
    KickingStats,
    PuntingStats,
    ReturnStats,
    ScoringStats,
}

/// Everything the pipeline needs to scrape one category.
#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    /// Page under `/years/{season}/`; empty for the season index.
    pub url_path: &'static str,
    /// Tables to extract; all but the first may be missing (multi-table pages).
    pub table_ids: &'static [&'static str],
    pub columns: ColumnMap,
    pub schema: TableSchema,
}

impl StatCategory {
    pub const ALL: [StatCategory; 15] = [
        StatCategory::TeamOffense,
        StatCategory::TeamDefense,
        StatCategory::Standings,
        StatCategory::Games,
        StatCategory::Kicking,
        StatCategory::Punting,
        StatCategory::Returns,
        StatCategory::PassingStats,
        StatCategory::RushingStats,
        StatCategory::ReceivingStats,
        StatCategory::DefenseStats,
        StatCategory::KickingStats,
        StatCategory::PuntingStats,
        StatCategory::ReturnStats,
        StatCategory::ScoringStats,
    ];

    pub fn as_str(&self) -> &'static str {
        self.spec().schema.table
    }

    pub fn spec(&self) -> &'static CategorySpec {
        match self {
            StatCategory::TeamOffense => &TEAM_OFFENSE,
            StatCategory::TeamDefense => &TEAM_DEFENSE,
            StatCategory::Standings => &STANDINGS,
            StatCategory::Games => &GAMES,
            StatCategory::Kicking => &KICKING,
            StatCategory::Punting => &PUNTING,
            StatCategory::Returns => &RETURNS,
            StatCategory::PassingStats => &PASSING_STATS,
            StatCategory::RushingStats => &RUSHING_STATS,
            StatCategory::ReceivingStats => &RECEIVING_STATS,
            StatCategory::DefenseStats => &DEFENSE_STATS,
            StatCategory::KickingStats => &KICKING_STATS,
            StatCategory::PuntingStats => &PUNTING_STATS,
            StatCategory::ReturnStats => &RETURN_STATS,
            StatCategory::ScoringStats => &SCORING_STATS,
        }
    }

    pub fn url(&self, season: i32) -> String {
        season_url(season, self.spec().url_path)
    }

    /// Player-level categories (keyed by player, season and team).
    pub fn is_player(&self) -> bool {
        self.spec().schema.has_column("player_name")
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatCategory {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        StatCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ScraperError::UnknownCategory(s.to_string()))
    }
}

const NAME: ColumnDef = ColumnDef::new("player_name", ColumnKind::Text(128)).required();
const TEAM: ColumnDef = ColumnDef::new("tm", ColumnKind::Text(64)).required();
const PLAYER_KEY: &[&str] = &["player_name", "season", "tm"];
const TEAM_KEY: &[&str] = &["tm", "season"];
const PLAYER_MARKERS: &[&str] = &["player_name"];

const fn team_map(entries: &'static [(&'static str, &'static str)]) -> ColumnMap {
    ColumnMap {
        entries,
        identity_stat: "team",
        identity_numeric: false,
        strip_markers: &[],
    }
}

const fn player_map(entries: &'static [(&'static str, &'static str)]) -> ColumnMap {
    ColumnMap {
        entries,
        identity_stat: "player",
        identity_numeric: false,
        strip_markers: PLAYER_MARKERS,
    }
}

// ---- team tables ----

pub static TEAM_OFFENSE: CategorySpec = CategorySpec {
    url_path: "",
    table_ids: &["team_stats"],
    columns: team_map(&[
        ("team", "tm"),
        ("g", "g"),
        ("points", "pf"),
        ("total_yards", "yds"),
        ("plays_offense", "ply"),
        ("yds_per_play_offense", "ypp"),
        ("turnovers", "turnovers"),
        ("fumbles_lost", "fl"),
        ("first_down", "firstd_total"),
        ("pass_cmp", "cmp"),
        ("pass_att", "att_pass"),
        ("pass_yds", "yds_pass"),
        ("pass_td", "td_pass"),
        ("pass_int", "ints"),
        ("pass_net_yds_per_att", "nypa"),
        ("pass_fd", "firstd_pass"),
        ("rush_att", "att_rush"),
        ("rush_yds", "yds_rush"),
        ("rush_td", "td_rush"),
        ("rush_yds_per_att", "ypa"),
        ("rush_fd", "firstd_rush"),
        ("penalties", "pen"),
        ("penalties_yds", "yds_pen"),
        ("pen_fd", "firstpy"),
        ("score_pct", "sc_pct"),
        ("turnover_pct", "to_pct"),
        ("exp_pts_tot", "opea"),
    ]),
    schema: TableSchema {
        table: "team_offense",
        columns: &[
            season(),
            count("rk"),
            TEAM,
            count("g"),
            count("pf"),
            int("yds"),
            count("ply"),
            decimal("ypp"),
            count("turnovers"),
            count("fl"),
            count("firstd_total"),
            count("cmp"),
            count("att_pass"),
            int("yds_pass"),
            count("td_pass"),
            count("ints"),
            decimal("nypa"),
            count("firstd_pass"),
            count("att_rush"),
            int("yds_rush"),
            count("td_rush"),
            decimal("ypa"),
            count("firstd_rush"),
            count("pen"),
            count("yds_pen"),
            count("firstpy"),
            pct("sc_pct"),
            pct("to_pct"),
            decimal("opea"),
        ],
        unique: TEAM_KEY,
    },
};

pub static TEAM_DEFENSE: CategorySpec = CategorySpec {
    url_path: "opp.htm",
    table_ids: &["team_stats"],
    columns: team_map(&[
        ("team", "tm"),
        ("g", "g"),
        ("points", "pa"),
        ("total_yards", "yds"),
        ("plays_offense", "ply"),
        ("yds_per_play_offense", "ypp"),
        ("turnovers", "turnovers"),
        ("fumbles_lost", "fl"),
        ("first_down", "firstd_total"),
        ("pass_cmp", "cmp"),
        ("pass_att", "att_pass"),
        ("pass_yds", "yds_pass"),
        ("pass_td", "td_pass"),
        ("pass_int", "ints"),
        ("pass_net_yds_per_att", "nypa"),
        ("pass_fd", "firstd_pass"),
        ("rush_att", "att_rush"),
        ("rush_yds", "yds_rush"),
        ("rush_td", "td_rush"),
        ("rush_yds_per_att", "ypa"),
        ("rush_fd", "firstd_rush"),
        ("penalties", "pen"),
        ("penalties_yds", "yds_pen"),
        ("pen_fd", "firstpy"),
        ("score_pct", "sc_pct"),
        ("turnover_pct", "to_pct"),
        ("exp_pts_def_tot", "depa"),
    ]),
    schema: TableSchema {
        table: "team_defense",
        columns: &[
            season(),
            count("rk"),
            TEAM,
            count("g"),
            count("pa"),
            int("yds"),
            count("ply"),
            decimal("ypp"),
            count("turnovers"),
            count("fl"),
            count("firstd_total"),
            count("cmp"),
            count("att_pass"),
            int("yds_pass"),
            count("td_pass"),
            count("ints"),
            decimal("nypa"),
            count("firstd_pass"),
            count("att_rush"),
            int("yds_rush"),
            count("td_rush"),
            decimal("ypa"),
            count("firstd_rush"),
            count("pen"),
            count("yds_pen"),
            count("firstpy"),
            pct("sc_pct"),
            pct("to_pct"),
            decimal("depa"),
        ],
        unique: TEAM_KEY,
    },
};

pub static STANDINGS: CategorySpec = CategorySpec {
    url_path: "",
    table_ids: &["AFC", "NFC"],
    columns: ColumnMap {
        entries: &[
            ("team", "tm"),
            ("wins", "w"),
            ("losses", "l"),
            ("ties", "t"),
            ("win_loss_perc", "win_pct"),
            ("points", "pf"),
            ("points_opp", "pa"),
            ("points_diff", "pd"),
            ("mov", "mov"),
            ("sos_total", "sos"),
            ("srs_total", "srs"),
            ("srs_offense", "osrs"),
            ("srs_defense", "dsrs"),
        ],
        identity_stat: "team",
        identity_numeric: false,
        strip_markers: &["tm"],
    },
    schema: TableSchema {
        table: "standings",
        columns: &[
            season(),
            TEAM,
            count("w"),
            count("l"),
            count("t"),
            ColumnDef::new("win_pct", ColumnKind::Decimal).range(0.0, 1.0),
            count("pf"),
            count("pa"),
            int("pd"),
            decimal("mov"),
            decimal("sos"),
            decimal("srs"),
            decimal("osrs"),
            decimal("dsrs"),
        ],
        unique: TEAM_KEY,
    },
};

pub static GAMES: CategorySpec = CategorySpec {
    url_path: "games.htm",
    table_ids: &["games"],
    columns: ColumnMap {
        entries: &[
            ("week_num", "week"),
            ("game_day_of_week", "game_day"),
            ("game_date", "game_date"),
            ("gametime", "kickoff_time"),
            ("winner", "winner"),
            ("loser", "loser"),
            ("boxscore_word", "boxscore"),
            ("pts_win", "pts_w"),
            ("pts_lose", "pts_l"),
            ("yards_win", "yds_w"),
            ("to_win", "to_w"),
            ("yards_lose", "yds_l"),
            ("to_lose", "to_l"),
        ],
        identity_stat: "week_num",
        identity_numeric: true,
        strip_markers: &[],
    },
    schema: TableSchema {
        table: "games",
        columns: &[
            season(),
            ColumnDef::new("week", ColumnKind::Int).required().range(0.0, 25.0),
            text("game_day", 16),
            date("game_date"),
            text("kickoff_time", 16),
            text("winner", 64),
            text("loser", 64),
            text("boxscore", 128),
            count("pts_w"),
            count("pts_l"),
            int("yds_w"),
            count("to_w"),
            int("yds_l"),
            count("to_l"),
        ],
        unique: &["season", "week", "winner", "loser"],
    },
};

pub static KICKING: CategorySpec = CategorySpec {
    url_path: "kicking.htm",
    table_ids: &["kicking"],
    columns: team_map(&[
        ("team", "tm"),
        ("g", "g"),
        ("fga1", "fga_0_19"),
        ("fgm1", "fgm_0_19"),
        ("fga2", "fga_20_29"),
        ("fgm2", "fgm_20_29"),
        ("fga3", "fga_30_39"),
        ("fgm3", "fgm_30_39"),
        ("fga4", "fga_40_49"),
        ("fgm4", "fgm_40_49"),
        ("fga5", "fga_50_plus"),
        ("fgm5", "fgm_50_plus"),
        ("fga", "fga"),
        ("fgm", "fgm"),
        ("fg_long", "lng"),
        ("fg_perc", "fg_pct"),
        ("xpa", "xpa"),
        ("xpm", "xpm"),
        ("xp_perc", "xp_pct"),
        ("kickoffs", "ko"),
        ("kickoffs_yds", "ko_yds"),
        ("kickoffs_touchback", "tb"),
        ("kickoffs_touchback_perc", "tb_pct"),
        ("kickoffs_avg_yds", "ko_avg"),
    ]),
    schema: TableSchema {
        table: "kicking",
        columns: &[
            season(),
            count("rk"),
            TEAM,
            count("g"),
            count("fga_0_19"),
            count("fgm_0_19"),
            count("fga_20_29"),
            count("fgm_20_29"),
            count("fga_30_39"),
            count("fgm_30_39"),
            count("fga_40_49"),
            count("fgm_40_49"),
            count("fga_50_plus"),
            count("fgm_50_plus"),
            count("fga"),
            count("fgm"),
            count("lng"),
            pct("fg_pct"),
            count("xpa"),
            count("xpm"),
            pct("xp_pct"),
            count("ko"),
            count("ko_yds"),
            count("tb"),
            pct("tb_pct"),
            rate("ko_avg"),
        ],
        unique: TEAM_KEY,
    },
};

pub static PUNTING: CategorySpec = CategorySpec {
    url_path: "",
    table_ids: &["punting"],
    columns: team_map(&[
        ("team", "tm"),
        ("g", "g"),
        ("punt", "pnt"),
        ("punt_yds", "yds"),
        ("punt_yds_per_punt", "ypp"),
        ("punt_ret_yds_opp", "retyds"),
        ("punt_net_yds", "net"),
        ("punt_net_yds_per_punt", "nyp"),
        ("punt_long", "lng"),
        ("punt_tb", "tb"),
        ("punt_tb_pct", "tb_pct"),
        ("punt_in_20", "in20"),
        ("punt_in_20_pct", "in20_pct"),
        ("punt_blocked", "blck"),
    ]),
    schema: TableSchema {
        table: "punting",
        columns: &[
            season(),
            count("rk"),
            TEAM,
            count("g"),
            count("pnt"),
            count("yds"),
            rate("ypp"),
            count("retyds"),
            count("net"),
            rate("nyp"),
            count("lng"),
            count("tb"),
            pct("tb_pct"),
            count("in20"),
            pct("in20_pct"),
            count("blck"),
        ],
        unique: TEAM_KEY,
    },
};

pub static RETURNS: CategorySpec = CategorySpec {
    url_path: "",
    table_ids: &["returns"],
    columns: team_map(&[
        ("team", "tm"),
        ("g", "g"),
        ("punt_ret", "ret_punt"),
        ("punt_ret_yds", "yds_punt"),
        ("punt_ret_td", "td_punt"),
        ("punt_ret_long", "lng_punt"),
        ("punt_ret_yds_per_ret", "ypr_punt"),
        ("kick_ret", "ret_kick"),
        ("kick_ret_yds", "yds_kick"),
        ("kick_ret_td", "td_kick"),
        ("kick_ret_long", "lng_kick"),
        ("kick_ret_yds_per_ret", "ypr_kick"),
        ("all_purpose_yds", "apyd"),
    ]),
    schema: TableSchema {
        table: "returns",
        columns: &[
            season(),
            count("rk"),
            TEAM,
            count("g"),
            count("ret_punt"),
            int("yds_punt"),
            count("td_punt"),
            int("lng_punt"),
            decimal("ypr_punt"),
            count("ret_kick"),
            int("yds_kick"),
            count("td_kick"),
            int("lng_kick"),
            decimal("ypr_kick"),
            int("apyd"),
        ],
        unique: TEAM_KEY,
    },
};

// ---- player tables ----

pub static PASSING_STATS: CategorySpec = CategorySpec {
    url_path: "passing.htm",
    table_ids: &["passing"],
    columns: player_map(&[
        ("player", "player_name"),
        ("age", "age"),
        ("team", "tm"),
        ("pos", "pos"),
        ("g", "g"),
        ("gs", "gs"),
        ("qb_rec", "qb_rec"),
        ("pass_cmp", "cmp"),
        ("pass_att", "att"),
        ("pass_cmp_perc", "cmp_pct"),
        ("pass_yds", "yds"),
        ("pass_td", "td"),
        ("pass_td_perc", "td_pct"),
        ("pass_int", "ints"),
        ("pass_int_perc", "int_pct"),
        ("pass_first_down", "first_downs"),
        ("pass_success_rate", "succ_pct"),
        ("pass_long", "lng"),
        ("pass_yds_per_att", "ypa"),
        ("pass_adj_yds_per_att", "ay_pa"),
        ("pass_yds_per_cmp", "ypc"),
        ("pass_yds_per_g", "ypg"),
        ("pass_rating", "rate"),
        ("qbr", "qbr"),
        ("pass_sacked", "sk"),
        ("pass_sacked_yds", "yds_sack"),
        ("pass_sacked_perc", "sk_pct"),
        ("pass_net_yds_per_att", "ny_pa"),
        ("pass_adj_net_yds_per_att", "any_pa"),
        ("comebacks", "four_qc"),
        ("gwd", "gwd"),
        ("awards", "awards"),
    ]),
    schema: TableSchema {
        table: "passing_stats",
        columns: &[
            season(),
            count("rk"),
            NAME,
            count("age"),
            TEAM,
            text("pos", 16),
            count("g"),
            count("gs"),
            text("qb_rec", 16),
            count("cmp"),
            count("att"),
            pct("cmp_pct"),
            int("yds"),
            count("td"),
            pct("td_pct"),
            count("ints"),
            pct("int_pct"),
            count("first_downs"),
            pct("succ_pct"),
            int("lng"),
            decimal("ypa"),
            decimal("ay_pa"),
            decimal("ypc"),
            decimal("ypg"),
            decimal("rate"),
            rate("qbr"),
            count("sk"),
            count("yds_sack"),
            pct("sk_pct"),
            decimal("ny_pa"),
            decimal("any_pa"),
            count("four_qc"),
            count("gwd"),
            text("awards", 128),
        ],
        unique: PLAYER_KEY,
    },
};

pub static RUSHING_STATS: CategorySpec = CategorySpec {
    url_path: "rushing.htm",
    table_ids: &["rushing"],
    columns: player_map(&[
        ("player", "player_name"),
        ("age", "age"),
        ("team", "tm"),
        ("pos", "pos"),
        ("g", "g"),
        ("gs", "gs"),
        ("rush_att", "att"),
        ("rush_yds", "yds"),
        ("rush_td", "td"),
        ("rush_first_down", "first_downs"),
        ("rush_success_rate", "succ_pct"),
        ("rush_long", "lng"),
        ("rush_yds_per_att", "ypa"),
        ("rush_yds_per_g", "ypg"),
        ("rush_att_per_g", "apg"),
        ("fumbles", "fmb"),
        ("awards", "awards"),
    ]),
    schema: TableSchema {
        table: "rushing_stats",
        columns: &[
            season(),
            count("rk"),
            NAME,
            count("age"),
            TEAM,
            text("pos", 16),
            count("g"),
            count("gs"),
            count("att"),
            int("yds"),
            count("td"),
            count("first_downs"),
            pct("succ_pct"),
            int("lng"),
            decimal("ypa"),
            decimal("ypg"),
            rate("apg"),
            count("fmb"),
            text("awards", 128),
        ],
        unique: PLAYER_KEY,
    },
};

pub static RECEIVING_STATS: CategorySpec = CategorySpec {
    url_path: "receiving.htm",
    table_ids: &["receiving"],
    columns: player_map(&[
        ("player", "player_name"),
        ("age", "age"),
        ("team", "tm"),
        ("pos", "pos"),
        ("g", "g"),
        ("gs", "gs"),
        ("targets", "tgt"),
        ("rec", "rec"),
        ("rec_yds", "yds"),
        ("rec_yds_per_rec", "ypr"),
        ("rec_td", "td"),
        ("rec_first_down", "first_downs"),
        ("rec_success", "succ_pct"),
        ("rec_long", "lng"),
        ("rec_per_g", "rpg"),
        ("rec_yds_per_g", "ypg"),
        ("catch_pct", "catch_pct"),
        ("rec_yds_per_tgt", "ypt"),
        ("fumbles", "fmb"),
        ("awards", "awards"),
    ]),
    schema: TableSchema {
        table: "receiving_stats",
        columns: &[
            season(),
            count("rk"),
            NAME,
            count("age"),
            TEAM,
            text("pos", 16),
            count("g"),
            count("gs"),
            count("tgt"),
            count("rec"),
            int("yds"),
            decimal("ypr"),
            count("td"),
            count("first_downs"),
            pct("succ_pct"),
            int("lng"),
            rate("rpg"),
            decimal("ypg"),
            pct("catch_pct"),
            decimal("ypt"),
            count("fmb"),
            text("awards", 128),
        ],
        unique: PLAYER_KEY,
    },
};

pub static DEFENSE_STATS: CategorySpec = CategorySpec {
    url_path: "defense.htm",
    table_ids: &["defense"],
    columns: player_map(&[
        ("player", "player_name"),
        ("age", "age"),
        ("team", "tm"),
        ("pos", "pos"),
        ("g", "g"),
        ("gs", "gs"),
        ("def_int", "ints"),
        ("def_int_yds", "int_yds"),
        ("def_int_td", "int_td"),
        ("def_int_long", "int_lng"),
        ("pass_defended", "pd"),
        ("fumbles_forced", "ff"),
        ("fumbles", "fmb"),
        ("fumbles_rec", "fr"),
        ("fumbles_rec_yds", "fr_yds"),
        ("fumbles_rec_td", "fr_td"),
        ("sacks", "sk"),
        ("tackles_combined", "comb"),
        ("tackles_solo", "solo"),
        ("tackles_assists", "ast"),
        ("tackles_loss", "tfl"),
        ("qb_hits", "qb_hits"),
        ("safety_md", "sfty"),
        ("awards", "awards"),
    ]),
    schema: TableSchema {
        table: "defense_stats",
        columns: &[
            season(),
            count("rk"),
            NAME,
            count("age"),
            TEAM,
            text("pos", 16),
            count("g"),
            count("gs"),
            count("ints"),
            int("int_yds"),
            count("int_td"),
            int("int_lng"),
            count("pd"),
            count("ff"),
            count("fmb"),
            count("fr"),
            int("fr_yds"),
            count("fr_td"),
            rate("sk"),
            count("comb"),
            count("solo"),
            count("ast"),
            count("tfl"),
            count("qb_hits"),
            count("sfty"),
            text("awards", 128),
        ],
        unique: PLAYER_KEY,
    },
};

pub static KICKING_STATS: CategorySpec = CategorySpec {
    url_path: "kicking.htm",
    table_ids: &["kicking"],
    columns: player_map(&[
        ("player", "player_name"),
        ("age", "age"),
        ("team", "tm"),
        ("pos", "pos"),
        ("g", "g"),
        ("gs", "gs"),
        ("fga1", "fga_0_19"),
        ("fgm1", "fgm_0_19"),
        ("fga2", "fga_20_29"),
        ("fgm2", "fgm_20_29"),
        ("fga3", "fga_30_39"),
        ("fgm3", "fgm_30_39"),
        ("fga4", "fga_40_49"),
        ("fgm4", "fgm_40_49"),
        ("fga5", "fga_50_plus"),
        ("fgm5", "fgm_50_plus"),
        ("fga", "fga"),
        ("fgm", "fgm"),
        ("fg_long", "lng"),
        ("fg_perc", "fg_pct"),
        ("xpa", "xpa"),
        ("xpm", "xpm"),
        ("xp_perc", "xp_pct"),
        ("kickoffs", "ko"),
        ("kickoffs_yds", "ko_yds"),
        ("kickoffs_touchback", "tb"),
        ("kickoffs_touchback_perc", "tb_pct"),
        ("kickoffs_avg_yds", "ko_avg"),
        ("awards", "awards"),
    ]),
    schema: TableSchema {
        table: "kicking_stats",
        columns: &[
            season(),
            count("rk"),
            NAME,
            count("age"),
            TEAM,
            text("pos", 16),
            count("g"),
            count("gs"),
            count("fga_0_19"),
            count("fgm_0_19"),
            count("fga_20_29"),
            count("fgm_20_29"),
            count("fga_30_39"),
            count("fgm_30_39"),
            count("fga_40_49"),
            count("fgm_40_49"),
            count("fga_50_plus"),
            count("fgm_50_plus"),
            count("fga"),
            count("fgm"),
            count("lng"),
            pct("fg_pct"),
            count("xpa"),
            count("xpm"),
            pct("xp_pct"),
            count("ko"),
            count("ko_yds"),
            count("tb"),
            pct("tb_pct"),
            rate("ko_avg"),
            text("awards", 128),
        ],
        unique: PLAYER_KEY,
    },
};

pub static PUNTING_STATS: CategorySpec = CategorySpec {
    url_path: "punting.htm",
    table_ids: &["punting"],
    columns: player_map(&[
        ("player", "player_name"),
        ("age", "age"),
        ("team", "tm"),
        ("pos", "pos"),
        ("g", "g"),
        ("gs", "gs"),
        ("punt", "pnt"),
        ("punt_yds", "yds"),
        ("punt_yds_per_punt", "ypp"),
        ("punt_return_yds", "ret_yds"),
        ("punt_net_yds", "net_yds"),
        ("punt_net_yds_per_punt", "ny_pa"),
        ("punt_long", "lng"),
        ("punt_touchback", "tb"),
        ("punt_touchback_perc", "tb_pct"),
        ("punt_inside_20", "pnt20"),
        ("punt_inside_20_perc", "in20_pct"),
        ("punt_blocked", "blck"),
        ("awards", "awards"),
    ]),
    schema: TableSchema {
        table: "punting_stats",
        columns: &[
            season(),
            count("rk"),
            NAME,
            count("age"),
            TEAM,
            text("pos", 16),
            count("g"),
            count("gs"),
            count("pnt"),
            count("yds"),
            rate("ypp"),
            count("ret_yds"),
            int("net_yds"),
            decimal("ny_pa"),
            count("lng"),
            count("tb"),
            pct("tb_pct"),
            count("pnt20"),
            pct("in20_pct"),
            count("blck"),
            text("awards", 128),
        ],
        unique: PLAYER_KEY,
    },
};

pub static RETURN_STATS: CategorySpec = CategorySpec {
    url_path: "returns.htm",
    table_ids: &["returns"],
    columns: player_map(&[
        ("player", "player_name"),
        ("age", "age"),
        ("team", "tm"),
        ("pos", "pos"),
        ("g", "g"),
        ("gs", "gs"),
        ("punt_ret", "pr"),
        ("punt_ret_yds", "pr_yds"),
        ("punt_ret_td", "pr_td"),
        ("punt_ret_long", "pr_lng"),
        ("punt_ret_yds_per_ret", "pr_ypr"),
        ("kick_ret", "kr"),
        ("kick_ret_yds", "kr_yds"),
        ("kick_ret_td", "kr_td"),
        ("kick_ret_long", "kr_lng"),
        ("kick_ret_yds_per_ret", "kr_ypr"),
        ("all_purpose_yds", "apyd"),
        ("awards", "awards"),
    ]),
    schema: TableSchema {
        table: "return_stats",
        columns: &[
            season(),
            count("rk"),
            NAME,
            count("age"),
            TEAM,
            text("pos", 16),
            count("g"),
            count("gs"),
            count("pr"),
            int("pr_yds"),
            count("pr_td"),
            int("pr_lng"),
            decimal("pr_ypr"),
            count("kr"),
            int("kr_yds"),
            count("kr_td"),
            int("kr_lng"),
            decimal("kr_ypr"),
            int("apyd"),
            text("awards", 128),
        ],
        unique: PLAYER_KEY,
    },
};

pub static SCORING_STATS: CategorySpec = CategorySpec {
    url_path: "scoring.htm",
    table_ids: &["scoring"],
    columns: player_map(&[
        ("player", "player_name"),
        ("age", "age"),
        ("team", "tm"),
        ("pos", "pos"),
        ("g", "g"),
        ("gs", "gs"),
        ("rush_td", "rush_td"),
        ("rec_td", "rec_td"),
        ("punt_ret_td", "pr_td"),
        ("kick_ret_td", "kr_td"),
        ("fumbles_rec_td", "fr_td"),
        ("def_int_td", "int_td"),
        ("scoring_oth_td", "oth_td"),
        ("all_td", "all_td"),
        ("two_pt_md", "two_pm"),
        ("def_two_pt_md", "d2p"),
        ("xpm", "xpm"),
        ("xpa", "xpa"),
        ("fgm", "fgm"),
        ("fga", "fga"),
        ("safety_md", "sfty"),
        ("scoring", "pts"),
        ("pts_per_g", "pts_pg"),
        ("awards", "awards"),
    ]),
    schema: TableSchema {
        table: "scoring_stats",
        columns: &[
            season(),
            count("rk"),
            NAME,
            count("age"),
            TEAM,
            text("pos", 16),
            count("g"),
            count("gs"),
            count("rush_td"),
            count("rec_td"),
            count("pr_td"),
            count("kr_td"),
            count("fr_td"),
            count("int_td"),
            count("oth_td"),
            count("all_td"),
            count("two_pm"),
            count("d2p"),
            count("xpm"),
            count("xpa"),
            count("fgm"),
            count("fga"),
            count("sfty"),
            count("pts"),
            rate("pts_pg"),
            text("awards", 128),
        ],
        unique: PLAYER_KEY,
    },
};
