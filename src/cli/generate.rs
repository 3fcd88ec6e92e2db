use peopledb::PeopleDb;

pub fn emails(db: &PeopleDb) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&db.generate_emails())?);
    Ok(())
}

pub fn usernames(db: &PeopleDb) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&db.generate_usernames())?);
    Ok(())
}

pub fn group_by_state(db: &PeopleDb) {
    for (state, people) in db.group_by_state() {
        let noun = if people.len() == 1 { "person" } else { "people" };
        println!("{state}: {} {noun}", people.len());
    }
}
