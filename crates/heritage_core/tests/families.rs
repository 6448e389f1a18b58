use heritage_core::db::open_db_in_memory;
use heritage_core::{
    Family, FamilyRepository, FamilyService, FamilyServiceError, FamilyValidationError, Person,
    PersonRepository, RepoError, SqliteFamilyRepository, SqlitePersonRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn family_service(
    conn: &Connection,
) -> FamilyService<SqliteFamilyRepository<'_>, SqlitePersonRepository<'_>> {
    FamilyService::new(
        SqliteFamilyRepository::try_new(conn).unwrap(),
        SqlitePersonRepository::try_new(conn).unwrap(),
    )
}

fn insert_person(conn: &Connection, name: &str, birth: Option<&str>) -> Person {
    let repo = SqlitePersonRepository::try_new(conn).unwrap();
    let mut person = Person::new(name);
    person.birth_date = birth.map(str::to_string);
    repo.create_person(&person).unwrap();
    person
}

#[test]
fn family_crud_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();

    let mut family = Family::new("Nguyen");
    family.description = Some("Nam Dinh branch".to_string());
    repo.create_family(&family).unwrap();
    assert_eq!(repo.get_family(family.id).unwrap(), Some(family.clone()));

    family.name = "Nguyen Duc".to_string();
    repo.update_family(&family).unwrap();
    assert_eq!(
        repo.get_family(family.id).unwrap().unwrap().name,
        "Nguyen Duc"
    );

    assert_eq!(repo.count_families().unwrap(), 1);
    repo.delete_family(family.id).unwrap();
    assert!(repo.get_family(family.id).unwrap().is_none());
    assert!(matches!(
        repo.delete_family(family.id),
        Err(RepoError::NotFound { entity: "family", .. })
    ));
}

#[test]
fn blank_family_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.create_family(&Family::new("  ")),
        Err(RepoError::InvalidFamily(FamilyValidationError::BlankName))
    ));
}

#[test]
fn list_families_is_ordered_by_name() {
    let conn = open_db_in_memory().unwrap();
    let service = family_service(&conn);

    service.create_family("Tran", None).unwrap();
    service.create_family("  Le   Van ", Some("  ".to_string())).unwrap();

    let families = service.list_families().unwrap();
    let names: Vec<&str> = families.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Le Van", "Tran"]);
    assert_eq!(families[0].description, None);
    assert_eq!(service.count_families().unwrap(), 2);
}

#[test]
fn add_member_checks_both_sides_and_defaults_role() {
    let conn = open_db_in_memory().unwrap();
    let service = family_service(&conn);
    let family = service.create_family("Pham", None).unwrap();
    let person = insert_person(&conn, "Pham Van A", None);

    assert!(matches!(
        service.add_member(Uuid::new_v4(), person.id, None),
        Err(FamilyServiceError::FamilyNotFound(_))
    ));
    assert!(matches!(
        service.add_member(family.id, Uuid::new_v4(), None),
        Err(FamilyServiceError::PersonNotFound(_))
    ));

    let membership = service.add_member(family.id, person.id, None).unwrap();
    assert_eq!(membership.role_in_family, "bloodline");

    assert!(matches!(
        service.add_member(family.id, person.id, Some("in-law")),
        Err(FamilyServiceError::AlreadyMember { .. })
    ));

    let memberships = service.list_memberships(family.id).unwrap();
    assert_eq!(memberships, vec![membership]);
}

#[test]
fn members_are_listed_in_presentation_order() {
    let conn = open_db_in_memory().unwrap();
    let service = family_service(&conn);
    let family = service.create_family("Vo", None).unwrap();

    let younger = insert_person(&conn, "Vo Van C", Some("1960-01-01"));
    let elder = insert_person(&conn, "Vo Van A", Some("1930-01-01"));
    let twin_b = insert_person(&conn, "Vo Thi B", Some("1950-06-01"));
    let twin_a = insert_person(&conn, "Vo Thi A", Some("1950-06-01"));
    let outsider = insert_person(&conn, "Outsider", Some("1900-01-01"));

    for person in [&younger, &elder, &twin_b, &twin_a] {
        service.add_member(family.id, person.id, None).unwrap();
    }

    let members = service.list_members(family.id).unwrap();
    let ids: Vec<Uuid> = members.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![elder.id, twin_a.id, twin_b.id, younger.id]);
    assert!(!ids.contains(&outsider.id));
}

#[test]
fn remove_member_and_cascades() {
    let conn = open_db_in_memory().unwrap();
    let service = family_service(&conn);
    let family = service.create_family("Dang", None).unwrap();
    let first = insert_person(&conn, "Dang Van A", None);
    let second = insert_person(&conn, "Dang Van B", None);
    service.add_member(family.id, first.id, Some("founder")).unwrap();
    service.add_member(family.id, second.id, None).unwrap();

    service.remove_member(family.id, first.id).unwrap();
    assert!(matches!(
        service.remove_member(family.id, first.id),
        Err(FamilyServiceError::NotMember { .. })
    ));

    let families = service.families_of_person(second.id).unwrap();
    assert_eq!(families.len(), 1);

    service.delete_family(family.id).unwrap();
    let persons = SqlitePersonRepository::try_new(&conn).unwrap();
    assert!(persons.get_person(second.id).unwrap().is_some());
    assert!(service.families_of_person(second.id).unwrap().is_empty());
}

#[test]
fn deleting_person_drops_memberships() {
    let conn = open_db_in_memory().unwrap();
    let service = family_service(&conn);
    let family = service.create_family("Bui", None).unwrap();
    let person = insert_person(&conn, "Bui Van A", None);
    service.add_member(family.id, person.id, None).unwrap();

    SqlitePersonRepository::try_new(&conn)
        .unwrap()
        .delete_person(person.id)
        .unwrap();

    assert!(service.list_memberships(family.id).unwrap().is_empty());
}
