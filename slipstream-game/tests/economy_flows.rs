//! Economy ledger flows through the campaign loop: wages, prizes, sponsor
//! payouts, spend settlement, and insolvency reporting.

use slipstream_game::{
    CarComponent, Contract, GameConfig, Session, SkillSet, SolvencyStatus, SponsorCatalog,
    SponsorId, World,
};

fn fixture_session(opening_balance: i64, seed: u64) -> (Session, SponsorId) {
    let mut world = World::default();
    let player = world.add_team("Fenwick Racing", opening_balance);
    let driver = world.add_driver("R. Calloway", 1924, SkillSet::new(68, 70, 62));
    world.drivers.get_mut(&driver).unwrap().contract = Some(Contract {
        team: player,
        wage: 5_000,
        seasons_remaining: 4,
    });
    world.teams.get_mut(&player).unwrap().drivers.push(driver);
    world.add_car(player, 64, 60, 85);

    for idx in 0..5_u32 {
        let rival = world.add_team(&format!("Rival {idx}"), 400_000);
        let rival_driver = world.add_driver(
            &format!("Rival Driver {idx}"),
            1920 + idx,
            SkillSet::new(54 + (idx as u8) * 2, 58, 54),
        );
        world
            .drivers
            .get_mut(&rival_driver)
            .unwrap()
            .contract = Some(Contract {
            team: rival,
            wage: 4_000,
            seasons_remaining: 4,
        });
        world
            .teams
            .get_mut(&rival)
            .unwrap()
            .drivers
            .push(rival_driver);
        world.add_car(rival, 55 + idx as u8, 56, 74);
    }

    let offer = SponsorCatalog::standard()
        .iter()
        .next()
        .expect("catalog has sponsors");
    let sponsor = world.add_sponsor(&offer.name, offer.terms.clone());

    let session =
        Session::new(GameConfig::standard().clone(), world, player, 1947, seed).unwrap();
    (session, sponsor)
}

#[test]
fn broke_team_reports_insolvency_once_per_settlement() {
    // Treasury at zero, weekly wage and running cost with no income.
    let (mut session, _) = fixture_session(0, 1);

    let mut insolvency_reports = 0;
    let mut balances = Vec::new();
    for _ in 0..3 {
        // Stay away from race weeks so no prize income muddies the flow.
        assert!(session.current_event().is_none(), "fixture assumes early weeks are quiet");
        let report = session.advance_week().unwrap();
        match report.settlement.solvency {
            SolvencyStatus::Insolvent(condition) => {
                insolvency_reports += 1;
                assert!(condition.balance < condition.floor);
                assert_eq!(condition.shortfall, condition.floor - condition.balance);
            }
            SolvencyStatus::Solvent { .. } => {}
        }
        balances.push(report.settlement.balance_after);
    }

    assert_eq!(
        insolvency_reports, 3,
        "each weekly settlement reports the breach exactly once"
    );
    // Wages (5000) plus running cost (8000) drain 13000 per week.
    assert_eq!(balances, vec![-13_000, -26_000, -39_000]);
}

#[test]
fn wages_fall_due_even_without_racing() {
    let (mut session, _) = fixture_session(100_000, 2);
    let report = session.advance_week().unwrap();
    assert_eq!(report.settlement.settlement.wage_cost, 5_000);
    assert_eq!(report.settlement.settlement.running_cost, 8_000);
    assert_eq!(report.settlement.settlement.prize_income, 0);
    assert_eq!(session.balance(), 100_000 - 13_000);
}

#[test]
fn decision_spends_settle_with_the_week() {
    let (mut session, _) = fixture_session(200_000, 3);
    let car = session.world().teams[&session.player_team()].cars[0];

    session.upgrade_car(car, CarComponent::Engine, 6_000).unwrap();
    session.maintain_car(car, 2_000).unwrap();
    assert_eq!(session.balance(), 200_000, "spend is pending until settlement");

    let report = session.advance_week().unwrap();
    assert_eq!(report.settlement.settlement.upgrade_spend, 6_000);
    assert_eq!(report.settlement.settlement.maintenance_spend, 2_000);
    assert_eq!(session.balance(), 200_000 - 6_000 - 2_000 - 13_000);

    // Pending spend resets; the next week settles only recurring costs.
    let next = session.advance_week().unwrap();
    assert_eq!(next.settlement.settlement.upgrade_spend, 0);
    assert_eq!(next.settlement.settlement.maintenance_spend, 0);
}

#[test]
fn pending_spend_counts_against_affordability() {
    let (mut session, _) = fixture_session(10_000, 4);
    let car = session.world().teams[&session.player_team()].cars[0];

    session.upgrade_car(car, CarComponent::Engine, 6_000).unwrap();
    // Only 4000 remains uncommitted.
    assert!(session.upgrade_car(car, CarComponent::Chassis, 6_000).is_err());
    session.upgrade_car(car, CarComponent::Chassis, 4_000).unwrap();
}

#[test]
fn race_weeks_pay_prizes_and_sponsors() {
    let (mut session, sponsor) = fixture_session(300_000, 6);
    let offer = SponsorCatalog::standard().iter().next().unwrap();

    let signing = session.accept_sponsor(sponsor).unwrap();
    assert_eq!(
        signing.settlement.sponsor_income, offer.terms.signing_bonus,
        "signing bonus settles immediately"
    );

    while session.current_event().is_none() {
        session.advance_week().unwrap();
    }
    session.enter_race().unwrap();
    let report = session.advance_week().unwrap();
    let race = report.race.expect("race week resolves");

    let player_entry = race
        .classification
        .iter()
        .find(|c| c.team == session.player_team())
        .expect("player started the race");

    // Appearance money is due even on a retirement.
    assert!(
        report.settlement.settlement.sponsor_income >= offer.terms.per_start,
        "appearance fee missing: {}",
        report.settlement.settlement.sponsor_income
    );

    // Prize income is the constructor's cut of the classified prize.
    let expected_cut = session
        .config()
        .economy
        .constructor_cut(player_entry.prize);
    assert_eq!(report.settlement.settlement.prize_income, expected_cut);
}

#[test]
fn season_of_prizes_never_exceeds_purse_ceiling() {
    let (mut session, _) = fixture_session(500_000, 7);
    let weeks = session.config().calendar.weeks_per_year;

    let mut total_prizes: i64 = 0;
    let mut ceiling: i64 = 0;
    for _ in 0..weeks {
        if session.current_event().is_some() {
            session.enter_race().unwrap();
        }
        let report = session.advance_week().unwrap();
        if let Some(race) = &report.race {
            total_prizes += race.classification.iter().map(|c| c.prize).sum::<i64>();
            ceiling += session
                .config()
                .purse
                .max_total(race.classification.len(), race.prestige);
        }
    }
    assert!(total_prizes <= ceiling);
    assert!(total_prizes > 0, "a season of racing pays some prize money");
}
